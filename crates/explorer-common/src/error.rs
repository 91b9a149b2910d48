//! Error types for manifest loading and validation.

use thiserror::Error;

/// Result type alias using ManifestError.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Errors raised while reading or validating a scene manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest: {0}")]
    Io(String),

    #[error("Malformed manifest: {0}")]
    Parse(String),

    #[error("Scene {pos} references unknown layer '{layer}'")]
    UnknownLayer { pos: usize, layer: String },

    #[error("Layer '{layer}' belongs to both '{first}' and '{second}'")]
    LayerInMultipleGroups {
        layer: String,
        first: String,
        second: String,
    },

    #[error("Layer group '{group}' lists unknown layer '{layer}'")]
    UnknownGroupMember { group: String, layer: String },

    #[error("Duplicate layer name: {0}")]
    DuplicateLayer(String),

    #[error("Invalid options for layer '{layer}': {message}")]
    InvalidLayerOptions { layer: String, message: String },

    #[error("Terrain view names unknown elevation band '{0}'")]
    UnknownElevationBand(String),
}

impl ManifestError {
    /// Create an InvalidLayerOptions error.
    pub fn invalid_options(layer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLayerOptions {
            layer: layer.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ManifestError {
    fn from(err: std::io::Error) -> Self {
        ManifestError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ManifestError {
    fn from(err: serde_json::Error) -> Self {
        ManifestError::Parse(err.to_string())
    }
}
