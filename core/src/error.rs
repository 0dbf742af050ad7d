//! Error types for the portguard-core library.

use thiserror::Error;

/// Result type alias for portguard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while enumerating, resolving and assessing listeners.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to execute a system command.
    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    /// Failed to parse command output.
    #[error("Failed to parse output: {0}")]
    ParseError(String),

    /// A single enumerated listener could not be turned into a record.
    #[error("Malformed listener {listener}: {reason}")]
    MalformedListener { listener: String, reason: String },

    /// Permission denied for an operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Platform not supported.
    #[error("Platform not supported: {0}")]
    UnsupportedPlatform(String),
}

impl Error {
    pub(crate) fn malformed(listener: impl ToString, reason: impl Into<String>) -> Self {
        Error::MalformedListener {
            listener: listener.to_string(),
            reason: reason.into(),
        }
    }
}
