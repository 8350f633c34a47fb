//! Config command - show or change the configuration.

use std::path::PathBuf;

use anyhow::Result;
use portmem_core::{Config, ConfigStore};

/// Load the configuration from `path`, or from the default location.
///
/// Without a home directory there is no default location and the
/// built-in defaults apply.
pub async fn load(path: Option<PathBuf>) -> Result<Config> {
    let store = match path {
        Some(path) => ConfigStore::with_path(path),
        None => match ConfigStore::new() {
            Ok(store) => store,
            Err(e) => {
                tracing::debug!(error = %e, "no default config location, using defaults");
                return Ok(Config::default());
            }
        },
    };
    tracing::debug!(path = %store.path().display(), "loading config");
    Ok(store.load().await?)
}

pub async fn show(path: Option<PathBuf>) -> Result<()> {
    let config = load(path).await?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Set one key and write the file back.
///
/// Unlike reading, writing needs a concrete location, so a missing home
/// directory is an error here.
pub async fn set(path: Option<PathBuf>, key: &str, value: &str) -> Result<()> {
    let store = match path {
        Some(path) => ConfigStore::with_path(path),
        None => ConfigStore::new()?,
    };

    let mut config = store.load().await?;
    config.set(key, value)?;
    store.save(&config).await?;
    tracing::info!(key, value, path = %store.path().display(), "config updated");

    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
