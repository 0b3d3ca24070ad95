//! Error types for trackprobe-container.

use thiserror::Error;

/// Result type for trackprobe-container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;

/// Error type for container parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// A variable-length integer had no marker bit or was longer than allowed.
    #[error("Malformed variable-length integer at offset {offset}")]
    MalformedVarint { offset: usize },

    /// A fixed-width field extends past the end of its buffer.
    #[error("Truncated field at offset {offset}: need {need} bytes, have {have}")]
    TruncatedField {
        offset: usize,
        need: usize,
        have: usize,
    },

    /// A structure is only partially present in the buffer.
    ///
    /// Extractors turn this into a `NeedMore`/`SkipTo` request; it never
    /// terminates an extraction on its own.
    #[error("Incomplete structure at offset {offset}: {needed} more bytes required")]
    Incomplete { offset: u64, needed: u64 },

    /// The structure violates the container format.
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    /// No known container signature matched.
    #[error("Unsupported container format")]
    UnsupportedFormat,
}

impl ContainerError {
    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Whether more bytes could resolve this error.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete { .. } | Self::TruncatedField { .. })
    }
}
