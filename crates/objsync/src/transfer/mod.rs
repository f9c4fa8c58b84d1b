//! Per-object transfer pipeline.
//!
//! Each object runs the full download, verify, upload, optional-delete
//! pipeline in a single attempt and always produces exactly one
//! [`TransferOutcome`]. Per-object errors never escape: they are folded into
//! the outcome so one bad object cannot halt the run. Retry policy is a
//! rerun of the whole engine, which is idempotent through the skip-existing
//! check.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::store::{DestStore, ObjectDescriptor, SourceStore};

/// Final state of one object's pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Downloaded, verified and uploaded (and deleted from source if
    /// configured).
    Transferred,

    /// Already present in the destination; no bytes were read.
    Skipped,

    /// Pipeline failed; see the attached error.
    Failed,
}

/// Which pipeline step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Download,
    Integrity,
    Upload,
    Delete,
    Worker,
}

/// Error detail attached to a `Failed` outcome: enough for a manual retry
/// pass (which step, what the backend said).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectError {
    /// Failed pipeline step.
    pub kind: ErrorKind,

    /// Underlying cause.
    pub message: String,
}

impl ObjectError {
    fn new(kind: ErrorKind, err: &SyncError) -> Self {
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for ObjectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Result of one pipeline execution. Created exactly once per descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOutcome {
    /// Object key.
    pub key: String,

    /// Final pipeline state.
    pub status: TransferStatus,

    /// Bytes moved to the destination. Non-zero on a delete failure too:
    /// the copy landed even though the move contract did not.
    pub bytes_transferred: u64,

    /// Error detail for `Failed` outcomes.
    pub error: Option<ObjectError>,

    /// Wall-clock pipeline duration.
    pub duration_ms: u64,
}

impl TransferOutcome {
    fn transferred(key: String, bytes: u64, started: Instant) -> Self {
        Self {
            key,
            status: TransferStatus::Transferred,
            bytes_transferred: bytes,
            error: None,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn skipped(key: String, started: Instant) -> Self {
        Self {
            key,
            status: TransferStatus::Skipped,
            bytes_transferred: 0,
            error: None,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn failed(key: String, error: ObjectError, bytes: u64, started: Instant) -> Self {
        Self {
            key,
            status: TransferStatus::Failed,
            bytes_transferred: bytes,
            error: Some(error),
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Failure outcome for a worker task that never reported back
    /// (panicked or was aborted). Keeps the one-outcome-per-descriptor
    /// invariant intact.
    pub(crate) fn worker_failed(key: String, message: impl Into<String>) -> Self {
        Self {
            key,
            status: TransferStatus::Failed,
            bytes_transferred: 0,
            error: Some(ObjectError {
                kind: ErrorKind::Worker,
                message: message.into(),
            }),
            duration_ms: 0,
        }
    }
}

/// Existence check against the destination. "Not found" is `false`; any
/// other backend error is logged and also treated as `false`, so a
/// transient probe failure can never suppress a transfer. Stale skip
/// information is acceptable, stale failure is not.
pub async fn exists_in_destination(dest: &dyn DestStore, bucket: &str, key: &str) -> bool {
    match dest.exists(bucket, key).await {
        Ok(present) => present,
        Err(e) => {
            warn!("{}: existence check failed, assuming absent: {}", key, e);
            false
        }
    }
}

/// Normalize a source-reported checksum into a comparable MD5 hex digest.
///
/// ETags come quoted; multipart-style tags (`<hex>-<parts>`) are not a
/// digest of the content, so they yield `None` and verification is skipped
/// for that object.
pub fn content_digest_hint(raw: &str) -> Option<String> {
    let trimmed = raw.trim_matches('"');
    if trimmed.is_empty() || trimmed.contains('-') {
        return None;
    }
    Some(trimmed.to_ascii_lowercase())
}

/// Run the full pipeline for one object. Infallible by design: every
/// per-object error becomes a `Failed` outcome.
pub async fn transfer_object(
    source: Arc<dyn SourceStore>,
    dest: Arc<dyn DestStore>,
    config: Arc<SyncConfig>,
    descriptor: ObjectDescriptor,
) -> TransferOutcome {
    let started = Instant::now();
    let key = descriptor.key;

    // Skip check: metadata-only, no bytes read.
    if config.transfer.skip_existing
        && exists_in_destination(dest.as_ref(), &config.destination.bucket, &key).await
    {
        info!("{}: already in destination, skipping", key);
        return TransferOutcome::skipped(key, started);
    }

    // Download the full body into a local buffer.
    debug!("{}: downloading {} bytes", key, descriptor.size);
    let (body, meta) = match source.get(&config.source.bucket, &key).await {
        Ok(v) => v,
        Err(e) => {
            return TransferOutcome::failed(
                key.clone(),
                ObjectError::new(ErrorKind::Download, &SyncError::download(&key, e.to_string())),
                0,
                started,
            );
        }
    };

    // Verify before upload: unverified content is never uploaded.
    if config.transfer.verify_checksums {
        let hint = meta
            .checksum
            .as_deref()
            .or(descriptor.checksum.as_deref())
            .and_then(content_digest_hint);
        match hint {
            Some(expected) => {
                let actual = format!("{:x}", md5::compute(&body));
                if actual != expected {
                    let err = SyncError::Integrity {
                        key: key.clone(),
                        expected,
                        actual,
                    };
                    warn!("{}", err);
                    return TransferOutcome::failed(
                        key,
                        ObjectError::new(ErrorKind::Integrity, &err),
                        0,
                        started,
                    );
                }
            }
            None => debug!("{}: no usable source checksum, verification skipped", key),
        }
    }

    // Upload under the same key; backend put is atomic per object.
    let bytes = body.len() as u64;
    let content_type = meta.content_type.as_deref();
    if let Err(e) = dest
        .put(&config.destination.bucket, &key, body, content_type)
        .await
    {
        return TransferOutcome::failed(
            key.clone(),
            ObjectError::new(ErrorKind::Upload, &SyncError::upload(&key, e.to_string())),
            0,
            started,
        );
    }

    // Delete only after a confirmed upload (and verification, when
    // enabled). A failed delete is a failed move even though the copy
    // landed: the object now exists in both buckets and the operator must
    // see that.
    if config.transfer.delete_source {
        if let Err(e) = source.delete(&config.source.bucket, &key).await {
            let err = SyncError::delete(&key, e.to_string());
            warn!("{}", err);
            return TransferOutcome::failed(
                key,
                ObjectError::new(ErrorKind::Delete, &err),
                bytes,
                started,
            );
        }
        debug!("{}: deleted from source", key);
    }

    info!("{}: transferred {} bytes", key, bytes);
    TransferOutcome::transferred(key, bytes, started)
}
