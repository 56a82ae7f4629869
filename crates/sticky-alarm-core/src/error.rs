//! Core error types for sticky-alarm-core.
//!
//! The tick path itself never fails: OS query problems degrade to "not found"
//! and launch failures are logged and skipped. Errors only surface from the
//! I/O at the edges (configuration files, autostart entries).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for sticky-alarm-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Autostart entry errors
    #[error("Autostart error: {0}")]
    Autostart(#[from] AutostartError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The data directory could not be determined or created
    #[error("Cannot prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Dot-path does not name an existing configuration value
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Autostart entry errors.
#[derive(Error, Debug)]
pub enum AutostartError {
    /// No platform location for autostart entries
    #[error("No autostart location available on this system")]
    NoLocation,

    /// Writing or removing the entry failed
    #[error("Failed to update autostart entry at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The shortcut helper ran but reported failure
    #[error("Shortcut creation failed: {0}")]
    ShortcutFailed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_into_core_error() {
        let err: CoreError = ConfigError::UnknownKey("alarm.volume".into()).into();
        assert_eq!(
            err.to_string(),
            "Configuration error: unknown config key: alarm.volume"
        );
    }

    #[test]
    fn autostart_error_keeps_source() {
        let err = AutostartError::Io {
            path: PathBuf::from("/tmp/x.desktop"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}
