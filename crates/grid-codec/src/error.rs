//! Error types for grid fetching and decoding.

use thiserror::Error;

/// Errors that can occur while obtaining or decoding a grid.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Transport or decompression failure: the bytes could not be obtained.
    #[error("failed to fetch grid from {url}: {message}")]
    Fetch { url: String, message: String },

    /// The decompressed payload does not match the wire layout.
    #[error("malformed grid: {0}")]
    Format(String),
}

impl CodecError {
    /// Create a Fetch error.
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a Format error.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Whether this error came from the transport rather than the payload.
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
