mod config;
pub mod database;

pub use config::{Config, EngineConfig};
pub use database::SnapshotStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `LEANSTREAK_DATA_DIR` overrides the location. Otherwise this is
/// `~/.config/leanstreak[-dev]/` based on `LEANSTREAK_ENV`; set
/// `LEANSTREAK_ENV=dev` to use the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("LEANSTREAK_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("LEANSTREAK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("leanstreak-dev")
            } else {
                base_dir.join("leanstreak")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
