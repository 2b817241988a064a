mod config;
pub mod kv;

pub use config::{Config, IdentityConfig, ReporterConfig, StorageConfig};
pub use kv::{KeyValueStore, MemoryKvStore, SqliteKvStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/mindguard[-dev]/` based on MINDGUARD_ENV.
///
/// Set MINDGUARD_ENV=dev to use development data directory. MINDGUARD_HOME
/// overrides the location entirely.
///
/// # Errors
/// Returns an error if creating the data directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("MINDGUARD_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("MINDGUARD_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("mindguard-dev")
            } else {
                base_dir.join("mindguard")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
