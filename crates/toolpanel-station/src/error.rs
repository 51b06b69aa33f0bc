//! Error types for station orchestration.

use std::path::PathBuf;

use toolpanel_hardware::HardwareError;
use toolpanel_network::AuthClientError;

/// Result type alias for station operations.
pub type Result<T> = std::result::Result<T, StationError>;

/// Errors that can stop the station from starting or end one of its tasks.
///
/// Failures inside a session (misreads, scan errors, request failures) are
/// logged and never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// A peripheral failed in a way its task cannot recover from.
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    /// The authorization client could not be created.
    #[error("Authorization client error: {0}")]
    Client(#[from] AuthClientError),

    /// A configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("Failed to read configuration file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StationError {
    /// Create a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
