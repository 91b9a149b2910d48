//! Error types for the view coordinator.

use explorer_common::ManifestError;
use grid_codec::CodecError;
use labels::LabelError;
use renderer::RenderError;
use scene_index::IndexError;
use thiserror::Error;

/// Errors surfaced by [`ViewController`](crate::ViewController).
#[derive(Error, Debug)]
pub enum ViewError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Label(#[from] LabelError),

    #[error("no scene is visible")]
    NoScene,

    #[error("unknown layer '{0}'")]
    UnknownLayer(String),

    #[error("layer '{0}' has no raw data")]
    NotDataLayer(String),

    #[error("layer '{layer}' is unavailable for the current scene")]
    LayerUnavailable { layer: String },

    #[error("labels are not enabled")]
    LabelsDisabled,

    #[error("terrain view is not configured")]
    TerrainUnavailable,

    #[error("terrain zoom must be positive, got {0}")]
    InvalidZoom(f32),
}

/// Result type for view operations.
pub type Result<T> = std::result::Result<T, ViewError>;
