//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use std::path::Path;

use crate::error::Result;

impl SyncConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: SyncConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_yaml_with_defaults() {
        let config = SyncConfig::from_yaml(
            r#"
source:
  root: /srv/objects
  bucket: photos
destination:
  root: /mnt/archive
  bucket: photos
"#,
        )
        .unwrap();

        assert_eq!(config.source.backend, "fs");
        assert_eq!(config.transfer.get_max_workers(), 5);
        assert!(config.transfer.verify_checksums);
        assert!(config.transfer.skip_existing);
        assert!(!config.transfer.delete_source);
        assert_eq!(config.transfer.prefix, "");
    }

    #[test]
    fn test_from_yaml_rejects_invalid() {
        let err = SyncConfig::from_yaml(
            r#"
source:
  root: /srv/objects
  bucket: photos
destination:
  root: /srv/objects
  bucket: photos
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("same bucket"));
    }

    #[test]
    fn test_from_yaml_explicit_options() {
        let config = SyncConfig::from_yaml(
            r#"
source:
  root: /srv/objects
  bucket: photos
destination:
  root: /mnt/archive
  bucket: backup
transfer:
  prefix: "2024/"
  max_workers: 12
  verify_checksums: false
  delete_source: true
"#,
        )
        .unwrap();

        assert_eq!(config.transfer.prefix, "2024/");
        assert_eq!(config.transfer.get_max_workers(), 12);
        assert!(!config.transfer.verify_checksums);
        assert!(config.transfer.delete_source);
    }
}
