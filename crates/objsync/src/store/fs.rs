//! Directory-backed object store.
//!
//! A bucket is a directory under the store root; an object key maps to a
//! relative file path, so keys may contain `/` separators. This is the
//! backend the CLI wires up for local runs; remote backends are supplied by
//! the embedding application.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use super::{DestStore, ListPage, ObjectDescriptor, ObjectMetadata, SourceStore};
use crate::error::{Result, SyncError};

/// Objects per listing page.
const PAGE_SIZE: usize = 1000;

/// Object store backed by a local directory tree.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`. The directory does not have to
    /// exist yet; buckets are created on first put.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        // Keys must stay inside the bucket directory.
        let relative = Path::new(key);
        if key.is_empty()
            || relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::RootDir))
        {
            return Err(SyncError::Backend(format!("invalid object key: {}", key)));
        }
        Ok(self.bucket_dir(bucket).join(relative))
    }
}

/// Collect all file keys under `dir`, relative to it, in sorted order.
///
/// Uses an explicit directory stack instead of recursion; listing is
/// metadata-only and runs rarely enough that sync IO is fine here.
fn collect_keys(dir: &Path) -> std::io::Result<Vec<(String, u64)>> {
    let mut keys = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        for entry in std::fs::read_dir(&current)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() {
                // In-progress puts are invisible until renamed into place.
                if path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(".objsync-partial"))
                {
                    continue;
                }
                let relative = path
                    .strip_prefix(dir)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .replace(std::path::MAIN_SEPARATOR, "/");
                keys.push((relative, entry.metadata()?.len()));
            }
        }
    }

    keys.sort();
    Ok(keys)
}

#[async_trait]
impl SourceStore for FsStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        token: Option<&str>,
    ) -> Result<ListPage> {
        let dir = self.bucket_dir(bucket);
        if !dir.is_dir() {
            return Err(SyncError::list(bucket, "bucket does not exist"));
        }

        let keys = collect_keys(&dir)
            .map_err(|e| SyncError::list(bucket, e.to_string()))?;

        let mut page = Vec::new();
        let mut next_token = None;
        for (key, size) in keys {
            if !key.starts_with(prefix) {
                continue;
            }
            if let Some(after) = token {
                if key.as_str() <= after {
                    continue;
                }
            }
            if page.len() == PAGE_SIZE {
                next_token = page.last().map(|d: &ObjectDescriptor| d.key.clone());
                break;
            }
            // No cheap content digest at listing time; the get path
            // computes one for verification.
            page.push(ObjectDescriptor {
                key,
                size,
                checksum: None,
            });
        }

        Ok(ListPage {
            objects: page,
            next_token,
        })
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<(Bytes, ObjectMetadata)> {
        let path = self.object_path(bucket, key)?;
        let body = match tokio::fs::read(&path).await {
            Ok(body) => Bytes::from(body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SyncError::NotFound(format!("{}/{}", bucket, key)))
            }
            Err(e) => return Err(SyncError::Backend(e.to_string())),
        };

        let meta = ObjectMetadata {
            size: body.len() as u64,
            checksum: Some(format!("{:x}", md5::compute(&body))),
            content_type: None,
        };
        Ok((body, meta))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SyncError::NotFound(format!("{}/{}", bucket, key)))
            }
            Err(e) => Err(SyncError::Backend(e.to_string())),
        }
    }
}

#[async_trait]
impl DestStore for FsStore {
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SyncError::Backend(e.to_string())),
        }
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        _content_type: Option<&str>,
    ) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::Backend(e.to_string()))?;
        }

        // Write to a temp file and rename for per-object atomicity: a
        // failed put never leaves a partially-written object visible.
        let mut tmp = path.clone().into_os_string();
        tmp.push(".objsync-partial");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, &body)
            .await
            .map_err(|e| SyncError::Backend(e.to_string()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| SyncError::Backend(e.to_string()))?;
        Ok(())
    }
}
