//! Shared server state.

use explorer_common::SceneManifest;
use grid_codec::FsSource;
use labels::{LabelDocument, LabelStore};
use renderer::{ColorMap, ColorMapRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{Result, ServerError};

pub const MANIFEST_FILE: &str = "scenes.json";
pub const LABELS_FILE: &str = "labels.json";

/// Everything a request handler can reach.
pub struct AppState {
    pub folder: PathBuf,
    pub source: FsSource,
    /// Scene manifest, when the folder has one; needed for rendering only.
    pub manifest: Option<SceneManifest>,
    pub labels: Option<RwLock<LabelStore>>,
    pub advertise_labels: bool,
    pub colormaps: RwLock<ColorMapRegistry>,
}

impl AppState {
    /// Open a scene folder.
    ///
    /// A missing manifest or label document is tolerated; a malformed one is
    /// a startup error.
    pub fn open(folder: impl Into<PathBuf>, advertise_labels: bool) -> Result<Self> {
        let folder = folder.into();
        if !folder.is_dir() {
            return Err(ServerError::Startup(format!(
                "{} is not a directory",
                folder.display()
            )));
        }

        let manifest_path = folder.join(MANIFEST_FILE);
        let manifest = if manifest_path.exists() {
            Some(
                SceneManifest::load(&manifest_path)
                    .map_err(|e| ServerError::Startup(e.to_string()))?,
            )
        } else {
            warn!(path = %manifest_path.display(), "No scene manifest, rendering disabled");
            None
        };

        let labels_path = folder.join(LABELS_FILE);
        let labels = if labels_path.exists() {
            let doc = LabelDocument::load(&labels_path)?;
            let scene_count = manifest.as_ref().map(|m| m.scenes.len()).unwrap_or(0);
            let store = LabelStore::new(doc, scene_count)?;
            debug!(scenes = scene_count, "Label store ready");
            Some(RwLock::new(store))
        } else {
            info!(path = %labels_path.display(), "No label document");
            None
        };

        Ok(Self {
            source: FsSource::new(&folder),
            folder,
            manifest,
            labels,
            advertise_labels,
            colormaps: RwLock::new(ColorMapRegistry::new()),
        })
    }

    /// Whether the label endpoint is offered to clients.
    pub fn labels_enabled(&self) -> bool {
        self.advertise_labels && self.labels.is_some()
    }

    pub fn labels_path(&self) -> PathBuf {
        self.folder.join(LABELS_FILE)
    }

    /// Write the label document back if it changed. Returns whether it did.
    pub async fn save_labels(&self) -> Result<bool> {
        let Some(labels) = &self.labels else {
            return Ok(false);
        };
        let mut store = labels.write().await;
        if !store.is_dirty() {
            return Ok(false);
        }
        let path = self.labels_path();
        store.snapshot().save(&path)?;
        store.mark_clean();
        debug!("Label store marked clean");
        Ok(true)
    }

    /// A colormap from the folder's `cmaps/`, loaded on first use.
    pub async fn colormap(&self, name: &str) -> Result<Arc<ColorMap>> {
        if let Ok(cmap) = self.colormaps.read().await.get(name) {
            return Ok(cmap);
        }
        let mut registry = self.colormaps.write().await;
        registry.load(&self.source, name).await?;
        Ok(registry.get(name)?)
    }
}
