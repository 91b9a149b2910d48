//! Common types shared across the scene explorer crates.
//!
//! The scene manifest (`scenes.json`) is the single document describing a
//! generated collection: the layer catalog, its mutually exclusive layer
//! groups and the time-ordered scene list.

pub mod error;
pub mod layer;
pub mod manifest;
pub mod scene;

pub use error::{ManifestError, ManifestResult};
pub use layer::{LayerCatalog, LayerInfo, LayerOptions};
pub use manifest::{SceneManifest, TerrainViewConfig};
pub use scene::{DataSourceRef, Scene};
