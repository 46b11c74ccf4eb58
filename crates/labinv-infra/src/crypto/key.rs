//! Token signing secret persisted in the data directory.
//!
//! The secret is 32 random bytes stored hex-encoded in `{data_dir}/jwt.key`.
//! It is generated on first start so tokens survive restarts without any
//! configuration.

use std::path::{Path, PathBuf};

use argon2::password_hash::rand_core::{OsRng, RngCore};
use thiserror::Error;

/// File name of the persisted secret.
pub const KEY_FILE: &str = "jwt.key";

/// Errors from loading or creating the signing secret.
///
/// Never includes key material.
#[derive(Debug, Error)]
pub enum KeyFileError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupted key file {0}")]
    Corrupted(PathBuf),
}

/// Load the secret from `{data_dir}/jwt.key`, creating it when missing.
pub async fn load_or_create_secret(data_dir: &Path) -> Result<Vec<u8>, KeyFileError> {
    let path = data_dir.join(KEY_FILE);
    let io_err = |source| KeyFileError::Io {
        path: path.clone(),
        source,
    };

    match tokio::fs::read_to_string(&path).await {
        Ok(content) => {
            let key = hex_decode(content.trim()).map_err(|_| KeyFileError::Corrupted(path.clone()))?;
            if key.len() != 32 {
                return Err(KeyFileError::Corrupted(path));
            }
            Ok(key)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tokio::fs::create_dir_all(data_dir).await.map_err(io_err)?;
            let key = rand_bytes();
            tokio::fs::write(&path, hex_encode(&key)).await.map_err(io_err)?;
            restrict_permissions(&path).await.map_err(io_err)?;
            tracing::info!(path = %path.display(), "generated token signing key");
            Ok(key.to_vec())
        }
        Err(e) => Err(io_err(e)),
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Generate 32 random bytes using the OS CSPRNG.
fn rand_bytes() -> [u8; 32] {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    key
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(s: &str) -> Result<Vec<u8>, String> {
    if s.len() % 2 != 0 || !s.is_ascii() {
        return Err("malformed hex string".to_string());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|e| format!("invalid hex at position {i}: {e}"))
        })
        .collect()
}
