//! Configuration loader for the lab inventory service.
//!
//! Reads `config.toml` from the data directory (`~/.labinv/` by default)
//! and deserializes it into [`AppConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use labinv_types::config::AppConfig;

use crate::crypto::key::{KeyFileError, load_or_create_secret};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "LABINV_DATA_DIR";

/// Environment variable overriding the token signing secret.
pub const JWT_SECRET_ENV: &str = "LABINV_JWT_SECRET";

/// Resolve the data directory.
///
/// Priority:
/// 1. `LABINV_DATA_DIR` environment variable
/// 2. `~/.labinv`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".labinv");
    }

    PathBuf::from(".labinv")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: defaults.
/// - Unreadable or unparsable file: a warning, then defaults.
pub async fn load_config(data_dir: &Path) -> AppConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            AppConfig::default()
        }
    }
}

/// Resolve the token signing secret.
///
/// Priority:
/// 1. `LABINV_JWT_SECRET` environment variable
/// 2. `[auth] jwt_secret` in `config.toml`
/// 3. `{data_dir}/jwt.key`, generated on first use
pub async fn resolve_jwt_secret(
    config: &AppConfig,
    data_dir: &Path,
) -> Result<Vec<u8>, KeyFileError> {
    let configured = std::env::var(JWT_SECRET_ENV)
        .ok()
        .or_else(|| config.auth.jwt_secret.clone())
        .filter(|s| !s.trim().is_empty());

    match configured {
        Some(secret) => {
            if secret.len() < 32 {
                tracing::warn!("configured token secret is shorter than 32 bytes");
            }
            Ok(secret.into_bytes())
        }
        None => load_or_create_secret(data_dir).await,
    }
}
