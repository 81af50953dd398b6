//! Error types for relay-core

use thiserror::Error;

/// Result type alias using relay-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in relay-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Local store error
    #[error("Store error: {0}")]
    Store(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote HTTP transport error
    #[error("Remote request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote document API error
    #[error("Remote API error: {0}")]
    RemoteApi(String),
}
