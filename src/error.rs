// file: src/error.rs
// version: 1.0.0
// guid: 458cf8a2-2c29-4b91-9198-0f6874b775cf

//! Error types for the remote access agent

use thiserror::Error;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, RemoteAccessError>;

/// Error types for provisioning remote access
#[derive(Error, Debug)]
pub enum RemoteAccessError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Command '{command}' failed (exit code {exit_code:?}): {stderr}")]
    ProcessError {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Package error: {0}")]
    PackageError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Tunnel error: {0}")]
    TunnelError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("System error: {0}")]
    SystemError(String),

    #[error("Aborted: {0}")]
    Aborted(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl RemoteAccessError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a new tunnel error
    pub fn tunnel(msg: impl Into<String>) -> Self {
        Self::TunnelError(msg.into())
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a new system error
    pub fn system(msg: impl Into<String>) -> Self {
        Self::SystemError(msg.into())
    }
}
