//! Error types for Sentidash.

use thiserror::Error;

/// The main error type for Sentidash.
///
/// The ranking engine itself never fails; these variants cover the
/// boundaries around it (configuration, entity sources, the action
/// channel and poll lookup).
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors (config files, fixtures, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Entity source errors
    #[error("Source error: {0}")]
    Source(String),

    /// Vote cast against a poll that is not loaded
    #[error("Unknown poll: {0}")]
    UnknownPoll(String),

    /// Invalid input or state
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Channel communication errors
    #[error("Channel error: {0}")]
    Channel(String),
}

/// Alias for Result with our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl Error {
    /// Create a new config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new source error.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create a new unknown poll error.
    pub fn unknown_poll(poll_id: impl Into<String>) -> Self {
        Self::UnknownPoll(poll_id.into())
    }

    /// Create a new invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new channel error.
    pub fn channel(msg: impl Into<String>) -> Self {
        Self::Channel(msg.into())
    }

    /// Check if this error is recoverable (caller can retry or ignore).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownPoll(_) | Self::Channel(_))
    }
}
