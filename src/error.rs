//! Error types for trackprobe.
//!
//! Parsing failures are collapsed into [`Error::DecodeFailed`] and
//! [`Error::FormatFailed`]; their causes are logged where they happen.

use thiserror::Error;

/// Result type for trackprobe operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by an extraction.
#[derive(Debug, Error)]
pub enum Error {
    /// The first chunk matched no known container signature.
    #[error("Unsupported container format")]
    UnsupportedFormat,

    /// The byte source failed.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// More bytes were read than the configured budget allows.
    #[error("Read budget exceeded: read {read} bytes, limit is {limit}")]
    BudgetExceeded { limit: u64, read: u64 },

    /// The container structure could not be decoded.
    #[error("Failed to decode container structure")]
    DecodeFailed,

    /// The track list could not be built from the decoded structure.
    #[error("Failed to read track metadata")]
    FormatFailed,

    /// The source ended before the track metadata was complete.
    #[error("Source ended after {read} bytes, before track metadata was complete")]
    Truncated { read: u64 },

    /// The input could not be opened.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Errors raised by byte sources.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A local read failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP request could not be completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered a range request with an unexpected status.
    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    /// A `200` response carried no `Content-Range` header.
    #[error("Server ignored the range request (no Content-Range header)")]
    MissingContentRange,

    #[error("Malformed Content-Range header: {0}")]
    MalformedContentRange(String),

    /// The source was read after being destroyed.
    #[error("Source has been destroyed")]
    Destroyed,

    /// The source was read while paused.
    #[error("Source is paused")]
    Paused,
}
