//! Error types for scene navigation.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The requested scene is filtered out of (or absent from) the visible
    /// sequence.
    #[error("scene {original_index} is not visible under the current filter")]
    NotVisible { original_index: usize },
}

pub type Result<T> = std::result::Result<T, IndexError>;
