//! Configuration system for orgshift
//!
//! Settings are read from a TOML file. Every section is optional and falls
//! back to its defaults, so an empty file is a valid configuration.

use std::path::{Path, PathBuf};

use orgshift_db::PROVIDER_MAX_BATCH_OPS;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, CoreError, Result};
use crate::layout;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrgshiftConfig {
    pub store: StoreConfig,
    pub batch: BatchConfig,
    pub migration: MigrationConfig,
    pub verify: VerifyConfig,
}

/// Location of the SQLite document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("orgshift")
                .join("store.db"),
        }
    }
}

/// Batch commit sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Operations per commit, kept below the provider ceiling.
    pub max_ops: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_ops: crate::batch::DEFAULT_BATCH_SIZE,
        }
    }
}

/// Which flat collections get copied under the tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Tenant-scoped collections other than users.
    pub collections: Vec<String>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            collections: layout::SCOPED_COLLECTIONS
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

/// Sample sizes used by the integrity verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyConfig {
    pub user_sample: usize,
    pub lookup_sample: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            user_sample: 10,
            lookup_sample: 5,
        }
    }
}

impl OrgshiftConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self, config_path: &str) -> Result<()> {
        let invalid = |field: &str, expected: &str, reason: String| CoreError::ConfigurationError {
            config_path: config_path.to_string(),
            field: field.to_string(),
            expected: expected.to_string(),
            cause: ConfigError::InvalidValue {
                field: field.to_string(),
                reason,
            },
        };

        if self.batch.max_ops == 0 || self.batch.max_ops > PROVIDER_MAX_BATCH_OPS {
            return Err(invalid(
                "batch.max_ops",
                "a value between 1 and 500",
                format!("got {}", self.batch.max_ops),
            ));
        }
        for collection in &self.migration.collections {
            if orgshift_db::validate_id(collection).is_err() {
                return Err(invalid(
                    "migration.collections",
                    "top-level collection ids",
                    format!("'{collection}' is not a collection id"),
                ));
            }
            if collection == layout::USERS {
                return Err(invalid(
                    "migration.collections",
                    "collections other than users",
                    "users are always migrated with their nested collections".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Resolve a path relative to a base directory
fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Load configuration from a specific file.
pub async fn load_config(path: &Path) -> Result<OrgshiftConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "file".to_string(),
            expected: "readable TOML file".to_string(),
            cause: ConfigError::Io(e.to_string()),
        })?;

    let mut config: OrgshiftConfig =
        toml::from_str(&content).map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "content".to_string(),
            expected: "valid TOML configuration".to_string(),
            cause: ConfigError::TomlParse(e.to_string()),
        })?;

    let base_dir = path.parent().unwrap_or(Path::new("."));
    config.store.path = resolve_path(base_dir, &config.store.path);

    config.validate(&path.display().to_string())?;
    Ok(config)
}

/// Standard config file locations
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("orgshift.toml")];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("orgshift").join("config.toml"));
    }

    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".orgshift").join("config.toml"));
    }

    paths
}

/// Load configuration from standard locations, or defaults if none exist.
pub async fn load_config_from_standard_locations() -> Result<OrgshiftConfig> {
    for path in config_paths() {
        if path.exists() {
            return load_config(&path).await;
        }
    }

    Ok(OrgshiftConfig::default())
}

/// Render the configuration as TOML.
pub fn to_toml(config: &OrgshiftConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| CoreError::ConfigurationError {
        config_path: "<memory>".to_string(),
        field: "serialization".to_string(),
        expected: "serializable config structure".to_string(),
        cause: ConfigError::TomlSerialize(e.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orgshift.toml");
        tokio::fs::write(&path, "[batch]\nmax_ops = 250\n[store]\npath = \"data/store.db\"\n")
            .await
            .unwrap();

        let config = load_config(&path).await.unwrap();
        assert_eq!(config.batch.max_ops, 250);
        assert_eq!(config.store.path, dir.path().join("data/store.db"));
        assert_eq!(config.verify, VerifyConfig::default());
        assert_eq!(config.migration.collections.len(), 4);
    }

    #[tokio::test]
    async fn test_batch_size_above_provider_limit_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orgshift.toml");
        tokio::fs::write(&path, "[batch]\nmax_ops = 900\n").await.unwrap();

        let err = load_config(&path).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::ConfigurationError { ref field, .. } if field == "batch.max_ops"
        ));
    }

    #[tokio::test]
    async fn test_users_cannot_be_listed_as_scoped_collection() {
        let mut config = OrgshiftConfig::default();
        config.migration.collections.push("users".to_string());
        assert!(config.validate("test").is_err());
    }

    #[tokio::test]
    async fn test_missing_file_is_a_configuration_error() {
        let err = load_config(Path::new("/nonexistent/orgshift.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ConfigurationError { .. }));
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let config = OrgshiftConfig::default();
        let rendered = to_toml(&config).unwrap();
        let parsed: OrgshiftConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
