//! Loading the documents a viewer needs before its first render.

use explorer_common::SceneManifest;
use grid_codec::DataSource;
use labels::{LabelDocument, LabelStore};
use tracing::{info, instrument};

use crate::Result;

/// Scene manifest location, relative to the scene folder.
pub const MANIFEST_URL: &str = "scenes.json";

/// Label document location, relative to the scene folder.
pub const LABELS_URL: &str = "labels.json";

/// Fetch and validate the scene manifest. Any failure is fatal.
#[instrument(skip(source), fields(source = %source.describe()))]
pub async fn fetch_manifest(source: &dyn DataSource) -> Result<SceneManifest> {
    let bytes = source.fetch(MANIFEST_URL).await?;
    let manifest = SceneManifest::from_json(&bytes)?;
    info!(
        scenes = manifest.scenes.len(),
        layers = manifest.catalog.len(),
        "Loaded scene manifest"
    );
    Ok(manifest)
}

/// Fetch the label document, if the folder has one.
///
/// A missing document disables labelling; a malformed one is an error.
#[instrument(skip(source), fields(source = %source.describe()))]
pub async fn fetch_labels(source: &dyn DataSource, scene_count: usize) -> Result<Option<LabelStore>> {
    let bytes = match source.fetch(LABELS_URL).await {
        Ok(bytes) => bytes,
        Err(e) => {
            info!(error = %e, "No label document, labelling disabled");
            return Ok(None);
        }
    };
    let doc = LabelDocument::from_json(&bytes)?;
    let store = LabelStore::new(doc, scene_count)?;
    info!(groups = store.schema().len(), "Loaded label document");
    Ok(Some(store))
}
