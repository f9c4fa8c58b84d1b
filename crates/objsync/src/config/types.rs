//! Configuration type definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure. Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Source bucket configuration.
    pub source: SourceConfig,

    /// Destination bucket configuration.
    pub destination: DestConfig,

    /// Transfer behavior configuration.
    #[serde(default)]
    pub transfer: TransferOptions,
}

/// Source bucket configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Backend type (only "fs" is wired up by the CLI; library embedders
    /// supply their own store implementations).
    #[serde(default = "default_fs")]
    pub backend: String,

    /// Store root (directory holding bucket directories for "fs").
    pub root: PathBuf,

    /// Bucket to transfer objects out of.
    pub bucket: String,
}

/// Destination bucket configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestConfig {
    /// Backend type (only "fs" is wired up by the CLI).
    #[serde(default = "default_fs")]
    pub backend: String,

    /// Store root (directory holding bucket directories for "fs").
    pub root: PathBuf,

    /// Bucket to transfer objects into.
    pub bucket: String,
}

/// Transfer behavior configuration.
///
/// `max_workers` uses `Option` to distinguish "not set" (use the default)
/// from "explicitly set"; validation rejects an explicit zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOptions {
    /// Only transfer keys starting with this prefix (default: all keys).
    #[serde(default)]
    pub prefix: String,

    /// Number of concurrent transfer pipelines (default: 5).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,

    /// Verify downloaded bytes against the source checksum before
    /// uploading (default: true).
    #[serde(default = "default_true")]
    pub verify_checksums: bool,

    /// Skip objects already present in the destination (default: true).
    #[serde(default = "default_true")]
    pub skip_existing: bool,

    /// Delete each source object after a confirmed upload, turning the
    /// copy into a move (default: false).
    #[serde(default)]
    pub delete_source: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            max_workers: None,
            verify_checksums: true,
            skip_existing: true,
            delete_source: false,
        }
    }
}

impl TransferOptions {
    /// Effective worker count, with the default applied.
    pub fn get_max_workers(&self) -> usize {
        self.max_workers.unwrap_or(5)
    }
}

fn default_fs() -> String {
    "fs".to_string()
}

fn default_true() -> bool {
    true
}
