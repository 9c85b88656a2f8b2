//! Error types for costwarden

use thiserror::Error;

/// Result type alias using costwarden's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for costwarden operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Outbound HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A GCP API call failed
    #[error("{operation} failed: {message}")]
    Gcp {
        /// The API operation that failed
        operation: String,
        /// Error detail from the API response
        message: String,
    },

    /// Malformed push envelope
    #[error("Invalid push envelope: {0}")]
    Envelope(String),

    /// Email delivery error
    #[error("Email error: {0}")]
    Email(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a GCP API error
    pub fn gcp(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Gcp {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create an envelope error
    pub fn envelope(msg: impl Into<String>) -> Self {
        Self::Envelope(msg.into())
    }

    /// Create an email error
    pub fn email(msg: impl Into<String>) -> Self {
        Self::Email(msg.into())
    }
}
