//! Error types for the carebloom_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for calls to the remote calendar store
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Core error type for carebloom_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Event or draft failed validation
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Time-of-day string was not `HH:MM`
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    /// Calendar date string could not be parsed
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Failure talking to the remote calendar store.
///
/// Returned by every [`crate::remote::RemoteStore`] call. The event store
/// logs these and carries on with local data; they never reach the caller
/// of a user-facing operation.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Remote sync is switched off (offline mode)
    #[error("remote store disabled")]
    Disabled,

    /// Connection refused, DNS failure, timeout
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    /// Non-2xx response
    #[error("remote store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not the expected JSON
    #[error("could not decode remote response: {0}")]
    Decode(String),
}
