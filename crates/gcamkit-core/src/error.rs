//! Error handling for GCamKit core
//!
//! Provides the error type shared by the configuration and units layers.
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for GCamKit core
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value failed validation
    #[error("Invalid configuration: {reason}")]
    Config {
        /// The reason the configuration is invalid.
        reason: String,
    },

    /// A textual enum value did not name any known variant
    #[error("Unknown {kind}: {value}")]
    UnknownVariant {
        /// The enum being parsed (e.g. "units").
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Create a configuration validation error
    pub fn config(reason: impl Into<String>) -> Self {
        Error::Config {
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown(kind: &'static str, value: &str) -> Self {
        Error::UnknownVariant {
            kind,
            value: value.to_string(),
        }
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config { .. })
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
