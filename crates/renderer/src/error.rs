//! Error types for colormaps, rasterizing and compositing.

use thiserror::Error;

/// Errors raised by the renderer.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A colormap was used before `load` succeeded for it.
    #[error("colormap '{0}' is not loaded")]
    ColorMapNotLoaded(String),

    /// Fetching or parsing a colormap table failed.
    #[error("failed to load colormap '{name}': {message}")]
    ColorMapLoad { name: String, message: String },

    /// A layer passed to the compositor differs in size from the first.
    #[error("layer {index} is {found:?}, expected {expected:?}")]
    DimensionMismatch {
        index: usize,
        expected: (u32, u32),
        found: (u32, u32),
    },

    /// Nothing to composite.
    #[error("no layers to composite")]
    NoLayers,

    /// PNG encoding or decoding failed.
    #[error("image encoding error: {0}")]
    Encode(String),
}

impl RenderError {
    /// Create a ColorMapLoad error.
    pub fn load(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ColorMapLoad {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an Encode error.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

/// Result type for renderer operations.
pub type Result<T> = std::result::Result<T, RenderError>;
