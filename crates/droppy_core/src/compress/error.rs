//! Compression error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while compressing media.
///
/// An unreachable target is not an error: the search returns its
/// lowest-quality result with `within_target == false` instead.
#[derive(Error, Debug)]
pub enum CompressError {
    /// The encoder failed; the search is aborted without retrying.
    #[error("Encode failed at parameter {parameter:.3}: {message}")]
    EncodeFailed { parameter: f64, message: String },

    /// Target byte count must be greater than zero.
    #[error("Target size must be greater than zero")]
    InvalidTarget,

    /// Search parameters are inconsistent.
    #[error("Invalid search configuration: {0}")]
    InvalidSearch(String),

    /// Source image could not be decoded.
    #[error("Failed to decode source: {0}")]
    Decode(String),

    /// File type cannot be compressed.
    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(PathBuf),

    /// Source file does not exist.
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),

    /// FFprobe failed or returned unusable data.
    #[error("Probe failed: {0}")]
    Probe(String),

    /// External tool could not be run.
    #[error("{0} not found or not runnable")]
    ToolMissing(String),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CompressError {
    /// Create an encode failed error.
    pub fn encode_failed(parameter: f64, message: impl Into<String>) -> Self {
        Self::EncodeFailed {
            parameter,
            message: message.into(),
        }
    }
}

/// Result type for compression operations.
pub type CompressResult<T> = Result<T, CompressError>;
