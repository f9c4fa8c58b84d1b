//! Error types for the transfer engine.

use thiserror::Error;

/// Main error type for transfer operations.
///
/// Per-object variants ([`Download`](SyncError::Download),
/// [`Integrity`](SyncError::Integrity), [`Upload`](SyncError::Upload),
/// [`Delete`](SyncError::Delete)) never escape a worker: they are converted
/// into `Failed` outcomes and folded into the summary. Only configuration
/// errors and a listing failure abort a run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bucket listing failed - fatal, no objects can be discovered
    #[error("Listing failed for bucket {bucket}: {message}")]
    List { bucket: String, message: String },

    /// Object does not exist in the backend
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Opaque backend error (network, auth, service-side)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Download from the source bucket failed
    #[error("Download failed for {key}: {message}")]
    Download { key: String, message: String },

    /// Downloaded bytes do not match the source-reported checksum
    #[error("Checksum mismatch for {key}: expected {expected}, got {actual}")]
    Integrity {
        key: String,
        expected: String,
        actual: String,
    },

    /// Upload to the destination bucket failed
    #[error("Upload failed for {key}: {message}")]
    Upload { key: String, message: String },

    /// Source delete failed after a successful copy - the object now exists
    /// in both buckets and the move contract was not fulfilled
    #[error("Delete failed for {key} after successful copy: {message}")]
    Delete { key: String, message: String },

    /// A worker task panicked or was aborted
    #[error("Worker failed for {key}: {message}")]
    Worker { key: String, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Create a List error for a bucket.
    pub fn list(bucket: impl Into<String>, message: impl Into<String>) -> Self {
        SyncError::List {
            bucket: bucket.into(),
            message: message.into(),
        }
    }

    /// Create a Download error for a key.
    pub fn download(key: impl Into<String>, message: impl Into<String>) -> Self {
        SyncError::Download {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an Upload error for a key.
    pub fn upload(key: impl Into<String>, message: impl Into<String>) -> Self {
        SyncError::Upload {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a Delete error for a key.
    pub fn delete(key: impl Into<String>, message: impl Into<String>) -> Self {
        SyncError::Delete {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }

    /// Exit code for the CLI: configuration problems are distinguishable
    /// from runtime failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            SyncError::Config(_) | SyncError::Yaml(_) => 2,
            SyncError::List { .. } => 3,
            _ => 1,
        }
    }
}

/// Result type alias for transfer operations.
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(SyncError::Config("bad".into()).exit_code(), 2);
        assert_eq!(SyncError::list("b", "denied").exit_code(), 3);
        assert_eq!(SyncError::download("k", "timeout").exit_code(), 1);
    }

    #[test]
    fn test_format_detailed_includes_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = SyncError::Io(io);
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: IO error"));
        assert!(detailed.contains("Caused by"));
    }
}
