//! Error types for the chartsync crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting or loading sync data
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Path does not exist
    #[error("path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    /// Invalid path (e.g., a file with no parent directory)
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Result type for chartsync operations
pub type Result<T> = std::result::Result<T, Error>;
