mod config;

pub use config::{AudioConfig, Config, ContentConfig, EngagementConfig, NotificationsConfig, UiConfig};

use std::path::PathBuf;

use crate::error::CoreError;

/// Returns `~/.config/felines[-dev]/` based on FELINES_ENV.
///
/// Set FELINES_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FELINES_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("felines-dev")
    } else {
        base_dir.join("felines")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
