//! Error types for rpitx-remote

use thiserror::Error;

/// Main error type for rpitx-remote
#[derive(Debug, Error)]
pub enum RpitxError {
    /// SSH connection failed
    #[error("SSH connection error: {0}")]
    Connection(String),

    /// Authentication failed (password or key)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Command execution timed out
    #[error("Command timeout after {0}ms")]
    Timeout(u64),

    /// Invalid parameters provided (frequency, message, ...)
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Remote rpitx install directory was not found
    #[error("rpitx directory not found at {0}")]
    NotFound(String),

    /// File transfer to the Pi failed
    #[error("Upload failed: {0}")]
    Upload(String),

    /// A transmission is already in progress
    #[error("Transmission already in progress: {0}")]
    Busy(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SSH key parsing error
    #[error("SSH key error: {0}")]
    SshKey(String),

    /// Settings file could not be read or written
    #[error("Settings error: {0}")]
    Settings(String),
}

/// Result type alias using RpitxError
pub type Result<T> = std::result::Result<T, RpitxError>;

impl RpitxError {
    /// Create a connection error from a string
    pub fn connection(msg: impl Into<String>) -> Self {
        RpitxError::Connection(msg.into())
    }

    /// Create an authentication error from a string
    pub fn auth(msg: impl Into<String>) -> Self {
        RpitxError::Authentication(msg.into())
    }

    /// Create an invalid params error from a string
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        RpitxError::InvalidParams(msg.into())
    }

    /// Create an upload error from a string
    pub fn upload(msg: impl Into<String>) -> Self {
        RpitxError::Upload(msg.into())
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        RpitxError::Config(msg.into())
    }

    /// Create a settings error from a string
    pub fn settings(msg: impl Into<String>) -> Self {
        RpitxError::Settings(msg.into())
    }
}
