//! Shared helpers for CLI commands.

use std::path::PathBuf;
use std::sync::Arc;

use miette::Result;
use orgshift_core::OrgshiftConfig;
use orgshift_core::config;
use orgshift_db::SqliteStore;
use tracing::info;

/// Environment variable overriding the configured store path.
pub const STORE_ENV: &str = "ORGSHIFT_STORE";

/// Load the configuration from `path`, or from the standard locations, then
/// apply the store override (command line first, then environment).
pub async fn load_config(path: Option<&PathBuf>, store: Option<PathBuf>) -> Result<OrgshiftConfig> {
    let mut config = match path {
        Some(path) => {
            info!("Loading config from: {}", path.display());
            config::load_config(path).await?
        }
        None => {
            info!("Loading config from standard locations");
            config::load_config_from_standard_locations().await?
        }
    };

    if let Some(store) = store.or_else(|| std::env::var_os(STORE_ENV).map(PathBuf::from)) {
        config.store.path = store;
    }
    Ok(config)
}

/// Open the document store named by the configuration.
pub async fn open_store(config: &OrgshiftConfig) -> Result<Arc<SqliteStore>> {
    let store = SqliteStore::open(&config.store.path)
        .await
        .map_err(|e| {
            miette::miette!("Failed to open store {}: {}", config.store.path.display(), e)
        })?;
    Ok(Arc::new(store))
}
