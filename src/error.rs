use std::time::Duration;
use thiserror::Error;

/// Why a single connection attempt failed
///
/// The waiter treats every variant the same way; the distinction only
/// exists so the cause can be logged.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Driver-level failure (DNS, refused, TLS, authentication, ...)
    #[error("PostgreSQL connection failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// The attempt did not finish within the connect timeout
    #[error("Connection attempt timed out after {0:?}")]
    Timeout(Duration),

    /// Failure reported by a non-PostgreSQL connector
    #[error("Connection failed: {message}")]
    Other {
        /// Error message details
        message: String,
    },
}

/// Errors raised while assembling a [`WaitConfig`](crate::WaitConfig)
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidEnv {
        /// Variable name
        var: String,
        /// Raw value found in the environment
        value: String,
        /// Parser message
        reason: String,
    },

    /// A setting was outside its allowed range
    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting {
        /// Setting name
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error wrapper
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;
