//! Error types for chainlink-jsonl operations.

use std::io;
use thiserror::Error;

/// The error type for chainlink-jsonl operations.
///
/// Parse failures on individual lines are not errors; see
/// [`Warning`](crate::Warning).
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading or writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A value could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for chainlink-jsonl operations.
pub type Result<T> = std::result::Result<T, Error>;
