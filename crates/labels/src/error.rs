//! Error types for label storage and sync.

use thiserror::Error;

/// Errors raised by the label store, the label document and label sync.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LabelError {
    #[error("unknown label group '{0}'")]
    UnknownGroup(String),

    #[error("'{value}' is not a permitted value of label group '{group}'")]
    InvalidValue { group: String, value: String },

    #[error("scene {pos} is out of range for label group '{group}' ({len} scenes)")]
    PosOutOfRange { group: String, pos: usize, len: usize },

    /// Pushing a change to the remote service failed.
    #[error("label sync failed: {0}")]
    Sync(String),

    #[error("label document I/O error: {0}")]
    Io(String),

    #[error("malformed label document: {0}")]
    Parse(String),
}

impl LabelError {
    /// Create a Sync error.
    pub fn sync(msg: impl Into<String>) -> Self {
        Self::Sync(msg.into())
    }
}

impl From<std::io::Error> for LabelError {
    fn from(err: std::io::Error) -> Self {
        LabelError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LabelError {
    fn from(err: serde_json::Error) -> Self {
        LabelError::Parse(err.to_string())
    }
}

/// Result type for label operations.
pub type Result<T> = std::result::Result<T, LabelError>;
