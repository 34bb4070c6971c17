//! Error types for ipd-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for ipd-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ipd-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid path format
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Access token does not match the accepted token grammar
    #[error("Invalid access token format: {0}")]
    InvalidCredential(String),

    /// Remote path does not exist
    ///
    /// This is a recoverable outcome: callers probe for existence with it.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The stored access token was rejected by the remote service
    #[error("Access token expired or revoked: {0}")]
    AuthExpired(String),

    /// Transport failure: connection error, unexpected status, or a body
    /// that could not be parsed. Carries the status and raw body when the
    /// request got far enough to produce them.
    #[error("Transport error{}: {}", .status.map(|s| format!(" (status {s})")).unwrap_or_default(), .message)]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Build a transport error from a completed exchange
    pub fn transport(status: u16, message: impl Into<String>) -> Self {
        Error::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Build a transport error for a failure before any response arrived
    pub fn connection(message: impl Into<String>) -> Self {
        Error::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Whether this error means the remote path simply does not exist
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_) => 2,          // UsageError
            Error::Config(_) => 2,               // UsageError
            Error::Transport { .. } => 3,        // NetworkError
            Error::InvalidCredential(_) => 4,    // AuthError
            Error::AuthExpired(_) => 4,          // AuthError
            Error::NotFound(_) => 5,             // NotFound
            _ => 1,                              // GeneralError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::InvalidPath("test".into()).exit_code(), 2);
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::connection("test").exit_code(), 3);
        assert_eq!(Error::transport(500, "test").exit_code(), 3);
        assert_eq!(Error::InvalidCredential("test".into()).exit_code(), 4);
        assert_eq!(Error::AuthExpired("test".into()).exit_code(), 4);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("/Deployment".into());
        assert_eq!(err.to_string(), "Not found: /Deployment");

        let err = Error::transport(500, "boom");
        assert_eq!(err.to_string(), "Transport error (status 500): boom");

        let err = Error::connection("refused");
        assert_eq!(err.to_string(), "Transport error: refused");
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound("x".into()).is_not_found());
        assert!(!Error::transport(500, "x").is_not_found());
    }
}
