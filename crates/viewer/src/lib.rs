//! View coordination for the scene explorer.
//!
//! The [`ViewController`] ties the scene index, label store and renderer
//! together and issues draw instructions through a [`ViewSurface`]. The
//! widgets behind that surface (map, thumbnail grid, terrain) live
//! elsewhere.

pub mod bootstrap;
pub mod cache;
pub mod controller;
pub mod error;
pub mod layers;
pub mod locator;
pub mod scene_data;
pub mod surface;

pub use bootstrap::{fetch_labels, fetch_manifest, LABELS_URL, MANIFEST_URL};
pub use cache::{GridCache, GridCacheStats};
pub use controller::{
    LoadTicket, LoadedScene, TerrainInputs, ViewController, ViewEvent, DEFAULT_GRID_CACHE_CAPACITY,
};
pub use error::{Result, ViewError};
pub use layers::LayerState;
pub use locator::{format_locator, parse_locator};
pub use scene_data::{LayerSlot, SceneData, LOADING, NO_DATA};
pub use surface::{LayerImage, Presentation, TracingSurface, ViewSurface};
