//! Error types for the event handler.

use thiserror::Error;

/// Errors raised by document stores.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),

    /// S3 request failed.
    #[error("S3 error: {0}")]
    S3(String),

    /// Store is misconfigured (missing credentials, bad root).
    #[error("store configuration error: {0}")]
    Config(String),

    /// I/O error from a local store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while handling an event.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Event payload could not be parsed.
    #[error("invalid event: {0}")]
    InvalidEvent(String),

    /// Store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub type Result<T> = std::result::Result<T, HandlerError>;
