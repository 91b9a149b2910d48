//! Scene manifest loading.
//!
//! The manifest is fetched once at startup. Loading stamps each scene's
//! 1-based `original_index` and validates the layer catalog so that later
//! stages can rely on every referenced layer being known.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::{LayerCatalog, LayerInfo, ManifestError, ManifestResult, Scene};

/// Optional 3-D terrain view parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainViewConfig {
    /// Name of the raw data layer holding elevations
    pub elevation_band: String,
}

/// Wire form of `scenes.json`.
#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    layers: Vec<LayerInfo>,
    #[serde(default)]
    layer_groups: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    index: Vec<Scene>,
    #[serde(default)]
    terrain_view: Option<TerrainViewConfig>,
    #[serde(default)]
    data_width: Option<usize>,
    #[serde(default)]
    data_height: Option<usize>,
}

/// A validated scene manifest.
#[derive(Debug, Clone)]
pub struct SceneManifest {
    pub catalog: LayerCatalog,
    pub scenes: Vec<Scene>,
    pub terrain_view: Option<TerrainViewConfig>,
    pub data_width: Option<usize>,
    pub data_height: Option<usize>,
}

impl SceneManifest {
    /// Parse and validate a manifest document.
    pub fn from_json(json: &[u8]) -> ManifestResult<Self> {
        let raw: RawManifest = serde_json::from_slice(json)?;
        Self::from_raw(raw)
    }

    /// Load a manifest from disk.
    pub fn load(path: impl AsRef<Path>) -> ManifestResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let manifest = Self::from_json(&bytes)?;
        info!(
            path = %path.display(),
            scenes = manifest.scenes.len(),
            layers = manifest.catalog.len(),
            "Loaded scene manifest"
        );
        Ok(manifest)
    }

    fn from_raw(raw: RawManifest) -> ManifestResult<Self> {
        let catalog = LayerCatalog::new(raw.layers, raw.layer_groups)?;

        let mut scenes = raw.index;
        for (idx, scene) in scenes.iter_mut().enumerate() {
            scene.original_index = idx + 1;

            for layer in scene.referenced_layers() {
                if !catalog.contains(layer) {
                    return Err(ManifestError::UnknownLayer {
                        pos: scene.pos,
                        layer: layer.to_string(),
                    });
                }
            }
            for (layer, source) in &scene.data_srcs {
                source.options.validate(layer)?;
            }
        }

        if let Some(terrain) = &raw.terrain_view {
            let known = catalog
                .get(&terrain.elevation_band)
                .map(|l| l.has_data)
                .unwrap_or(false);
            if !known {
                return Err(ManifestError::UnknownElevationBand(
                    terrain.elevation_band.clone(),
                ));
            }
        }

        debug!(groups = catalog.groups().len(), "Validated layer catalog");

        Ok(Self {
            catalog,
            scenes,
            terrain_view: raw.terrain_view,
            data_width: raw.data_width,
            data_height: raw.data_height,
        })
    }

    /// Scene with the given stable `pos`.
    pub fn scene_by_pos(&self, pos: usize) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.pos == pos)
    }

    /// Scene with the given 1-based original index.
    pub fn scene_by_original_index(&self, original_index: usize) -> Option<&Scene> {
        original_index
            .checked_sub(1)
            .and_then(|i| self.scenes.get(i))
    }
}
