mod config;

pub use config::{
    AlarmConfig, Config, RoutineConfig, TriggerConfig, WindowConfig, MAX_SNOOZE_MINUTES,
    MIN_SNOOZE_MINUTES,
};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/sticky-alarm[-dev]/` based on STICKY_ALARM_ENV.
///
/// Set STICKY_ALARM_ENV=dev to use the development data directory, or
/// STICKY_ALARM_HOME to use an explicit directory instead.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("STICKY_ALARM_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STICKY_ALARM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("sticky-alarm-dev")
            } else {
                base_dir.join("sticky-alarm")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
