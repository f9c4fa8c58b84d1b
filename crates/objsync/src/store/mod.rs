//! Backend traits for opaque object stores.
//!
//! The engine never talks to a concrete storage service: it consumes a
//! [`SourceStore`] (list/get/delete) and a [`DestStore`] (head/put). Remote
//! backends are external collaborators supplied by the caller; this module
//! ships two local implementations:
//!
//! - [`FsStore`]: a directory per bucket, a file per key, for local runs
//! - [`MemoryStore`]: a hash-map store with fault injection, for tests

mod fs;
mod memory;

pub use fs::FsStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Lightweight listing entry: key, size and an optional checksum hint,
/// without the object body. Immutable once listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    /// Object key within the bucket.
    pub key: String,

    /// Object size in bytes.
    pub size: u64,

    /// Source-reported content checksum (e.g. a normalized ETag), if known.
    pub checksum: Option<String>,
}

/// Metadata returned alongside a downloaded object body.
#[derive(Debug, Clone, Default)]
pub struct ObjectMetadata {
    /// Object size in bytes.
    pub size: u64,

    /// Source-reported content checksum, if the backend exposes one.
    pub checksum: Option<String>,

    /// Content type to carry over to the destination.
    pub content_type: Option<String>,
}

/// One page of a bucket listing.
#[derive(Debug, Default)]
pub struct ListPage {
    /// Descriptors in this page, in the backend's listing order.
    pub objects: Vec<ObjectDescriptor>,

    /// Continuation token for the next page, or `None` on the last page.
    pub next_token: Option<String>,
}

/// Read side of a transfer: the bucket objects are moved out of.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Fetch one page of the bucket listing, optionally filtered by a key
    /// prefix. Pass the previous page's `next_token` to continue.
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        token: Option<&str>,
    ) -> Result<ListPage>;

    /// Download the full object body and its metadata.
    async fn get(&self, bucket: &str, key: &str) -> Result<(Bytes, ObjectMetadata)>;

    /// Delete an object from the bucket.
    async fn delete(&self, bucket: &str, key: &str) -> Result<()>;
}

/// Write side of a transfer: the bucket objects are copied into.
#[async_trait]
pub trait DestStore: Send + Sync {
    /// Metadata-only probe: does the key exist in the bucket?
    ///
    /// Implementations map their backend's "not found" to `Ok(false)`;
    /// any other failure is an `Err` the caller may downgrade.
    async fn exists(&self, bucket: &str, key: &str) -> Result<bool>;

    /// Store the body under the key. Puts are atomic per object: a failed
    /// put must not leave a partially-written object visible.
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<()>;
}
