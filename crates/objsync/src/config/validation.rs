//! Configuration validation.

use super::SyncConfig;
use crate::error::{Result, SyncError};

/// Backends the CLI knows how to construct.
const KNOWN_BACKENDS: &[&str] = &["fs"];

/// Validate the configuration. Runs before the engine starts so a bad
/// config never dispatches a single transfer.
pub fn validate(config: &SyncConfig) -> Result<()> {
    // Source validation
    if config.source.bucket.is_empty() {
        return Err(SyncError::Config("source.bucket is required".into()));
    }
    if config.source.root.as_os_str().is_empty() {
        return Err(SyncError::Config("source.root is required".into()));
    }
    if !KNOWN_BACKENDS.contains(&config.source.backend.as_str()) {
        return Err(SyncError::Config(format!(
            "source.backend must be one of {:?}, got '{}'",
            KNOWN_BACKENDS, config.source.backend
        )));
    }

    // Destination validation
    if config.destination.bucket.is_empty() {
        return Err(SyncError::Config("destination.bucket is required".into()));
    }
    if config.destination.root.as_os_str().is_empty() {
        return Err(SyncError::Config("destination.root is required".into()));
    }
    if !KNOWN_BACKENDS.contains(&config.destination.backend.as_str()) {
        return Err(SyncError::Config(format!(
            "destination.backend must be one of {:?}, got '{}'",
            KNOWN_BACKENDS, config.destination.backend
        )));
    }

    // Cannot transfer a bucket into itself
    if config.source.backend == config.destination.backend
        && config.source.root == config.destination.root
        && config.source.bucket == config.destination.bucket
    {
        return Err(SyncError::Config(
            "source and destination cannot be the same bucket".into(),
        ));
    }

    // Transfer config validation - only check if explicitly set
    if let Some(0) = config.transfer.max_workers {
        return Err(SyncError::Config(
            "transfer.max_workers must be at least 1".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DestConfig, SourceConfig, TransferOptions};

    fn valid_config() -> SyncConfig {
        SyncConfig {
            source: SourceConfig {
                backend: "fs".to_string(),
                root: "/var/data/src".into(),
                bucket: "uploads".to_string(),
            },
            destination: DestConfig {
                backend: "fs".to_string(),
                root: "/var/data/dst".into(),
                bucket: "uploads".to_string(),
            },
            transfer: TransferOptions::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_source_bucket() {
        let mut config = valid_config();
        config.source.bucket = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_destination_bucket() {
        let mut config = valid_config();
        config.destination.bucket = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_backend() {
        let mut config = valid_config();
        config.source.backend = "carrier-pigeon".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_same_bucket_rejected() {
        let mut config = valid_config();
        config.destination.root = config.source.root.clone();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = valid_config();
        config.transfer.max_workers = Some(0);
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("max_workers"));
    }

    #[test]
    fn test_unset_workers_allowed() {
        let mut config = valid_config();
        config.transfer.max_workers = None;
        assert!(validate(&config).is_ok());
        assert_eq!(config.transfer.get_max_workers(), 5);
    }
}
