//! In-memory object store for tests.
//!
//! Backs buckets with a `BTreeMap` so listing order is deterministic, and
//! exposes per-key fault injection for download/upload/delete/head paths plus
//! a concurrency gauge over `get` calls. Not intended for production use.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use super::{DestStore, ListPage, ObjectDescriptor, ObjectMetadata, SourceStore};
use crate::error::{Result, SyncError};

/// Default objects per listing page.
const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
struct StoredObject {
    body: Bytes,
    checksum: String,
    content_type: Option<String>,
}

#[derive(Default)]
struct Inner {
    buckets: HashMap<String, BTreeMap<String, StoredObject>>,
    fail_get: HashSet<String>,
    fail_put: HashSet<String>,
    fail_delete: HashSet<String>,
    fail_head: HashSet<String>,
}

/// In-memory store implementing both [`SourceStore`] and [`DestStore`].
pub struct MemoryStore {
    inner: Mutex<Inner>,
    page_size: usize,
    get_delay: Option<Duration>,
    in_flight_gets: AtomicUsize,
    peak_in_flight_gets: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            page_size: DEFAULT_PAGE_SIZE,
            get_delay: None,
            in_flight_gets: AtomicUsize::new(0),
            peak_in_flight_gets: AtomicUsize::new(0),
        }
    }

    /// Set the listing page size (for pagination tests).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Delay every `get` call, making concurrent downloads observable.
    pub fn with_get_delay(mut self, delay: Duration) -> Self {
        self.get_delay = Some(delay);
        self
    }

    /// Insert an object; its checksum is the MD5 of the body.
    pub fn put_object(&self, bucket: &str, key: &str, body: impl Into<Bytes>) {
        let body = body.into();
        let checksum = format!("{:x}", md5::compute(&body));
        let mut inner = self.inner.lock().unwrap();
        inner.buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                body,
                checksum,
                content_type: None,
            },
        );
    }

    /// Overwrite the stored checksum, simulating source-side corruption.
    pub fn corrupt_checksum(&self, bucket: &str, key: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(obj) = inner
            .buckets
            .get_mut(bucket)
            .and_then(|objects| objects.get_mut(key))
        {
            obj.checksum = "0".repeat(32);
        }
    }

    /// Make every `get` for this key fail.
    pub fn fail_get(&self, key: &str) {
        self.inner.lock().unwrap().fail_get.insert(key.to_string());
    }

    /// Make every `put` for this key fail.
    pub fn fail_put(&self, key: &str) {
        self.inner.lock().unwrap().fail_put.insert(key.to_string());
    }

    /// Make every `delete` for this key fail.
    pub fn fail_delete(&self, key: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_delete
            .insert(key.to_string());
    }

    /// Make every `exists` probe for this key error out.
    pub fn fail_head(&self, key: &str) {
        self.inner.lock().unwrap().fail_head.insert(key.to_string());
    }

    /// Whether the key is present in the bucket.
    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .buckets
            .get(bucket)
            .map(|objects| objects.contains_key(key))
            .unwrap_or(false)
    }

    /// Body of a stored object, if present.
    pub fn object_body(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.inner
            .lock()
            .unwrap()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|obj| obj.body.clone())
    }

    /// Number of objects in the bucket.
    pub fn object_count(&self, bucket: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .buckets
            .get(bucket)
            .map(|objects| objects.len())
            .unwrap_or(0)
    }

    /// Highest number of `get` calls observed in flight at once.
    pub fn peak_concurrent_gets(&self) -> usize {
        self.peak_in_flight_gets.load(Ordering::Relaxed)
    }

    fn enter_get(&self) {
        let now = self.in_flight_gets.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight_gets.fetch_max(now, Ordering::SeqCst);
    }

    fn leave_get(&self) {
        self.in_flight_gets.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SourceStore for MemoryStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        token: Option<&str>,
    ) -> Result<ListPage> {
        let inner = self.inner.lock().unwrap();
        let objects = inner
            .buckets
            .get(bucket)
            .ok_or_else(|| SyncError::list(bucket, "bucket does not exist"))?;

        let range_start = match token {
            Some(after) => Bound::Excluded(after.to_string()),
            None => Bound::Unbounded,
        };

        let mut page = Vec::with_capacity(self.page_size);
        let mut next_token = None;
        for (key, obj) in objects.range((range_start, Bound::Unbounded)) {
            if !key.starts_with(prefix) {
                continue;
            }
            if page.len() == self.page_size {
                next_token = page.last().map(|d: &ObjectDescriptor| d.key.clone());
                break;
            }
            page.push(ObjectDescriptor {
                key: key.clone(),
                size: obj.body.len() as u64,
                checksum: Some(obj.checksum.clone()),
            });
        }

        Ok(ListPage {
            objects: page,
            next_token,
        })
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<(Bytes, ObjectMetadata)> {
        self.enter_get();
        if let Some(delay) = self.get_delay {
            tokio::time::sleep(delay).await;
        }

        let result = {
            let inner = self.inner.lock().unwrap();
            if inner.fail_get.contains(key) {
                Err(SyncError::Backend(format!("injected get failure for {}", key)))
            } else {
                inner
                    .buckets
                    .get(bucket)
                    .and_then(|objects| objects.get(key))
                    .cloned()
                    .ok_or_else(|| SyncError::NotFound(format!("{}/{}", bucket, key)))
            }
        };
        self.leave_get();

        let obj = result?;
        let meta = ObjectMetadata {
            size: obj.body.len() as u64,
            checksum: Some(obj.checksum.clone()),
            content_type: obj.content_type.clone(),
        };
        Ok((obj.body, meta))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_delete.contains(key) {
            return Err(SyncError::Backend(format!(
                "injected delete failure for {}",
                key
            )));
        }
        inner
            .buckets
            .get_mut(bucket)
            .and_then(|objects| objects.remove(key))
            .map(|_| ())
            .ok_or_else(|| SyncError::NotFound(format!("{}/{}", bucket, key)))
    }
}

#[async_trait]
impl DestStore for MemoryStore {
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_head.contains(key) {
            return Err(SyncError::Backend(format!(
                "injected head failure for {}",
                key
            )));
        }
        Ok(inner
            .buckets
            .get(bucket)
            .map(|objects| objects.contains_key(key))
            .unwrap_or(false))
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<()> {
        let checksum = format!("{:x}", md5::compute(&body));
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_put.contains(key) {
            return Err(SyncError::Backend(format!("injected put failure for {}", key)));
        }
        inner.buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                body,
                checksum,
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(())
    }
}
