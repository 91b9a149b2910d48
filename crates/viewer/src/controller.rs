//! The view coordinator.
//!
//! [`ViewController`] owns the scene index, layer state, label store and
//! colormap registry, reacts to [`ViewEvent`]s and drives a
//! [`ViewSurface`]. Scene loads are split into three steps so a caller can
//! run the fetch concurrently with other events:
//!
//! 1. [`ViewController::begin_navigation`] draws what is known immediately
//!    and hands back a self-contained [`LoadTicket`],
//! 2. [`LoadTicket::load`] fetches and decodes the scene's raw layers,
//! 3. [`ViewController::apply_loaded`] installs the result, unless a later
//!    navigation has superseded it.
//!
//! [`ViewController::handle`] runs all three in sequence.

use explorer_common::{LayerCatalog, Scene, SceneManifest, TerrainViewConfig};
use futures::stream::{self, StreamExt};
use grid_codec::{fetch_grid, DataSource, DecodedGrid};
use image::RgbaImage;
use labels::{LabelChange, LabelStore, LabelSync, NoopSync, SyncQueue};
use renderer::{decode_png, flatten, to_image, to_legend, ColorMapRegistry, ColorScale};
use renderer::{LEGEND_HEIGHT, LEGEND_WIDTH};
use scene_index::{IndexError, MonthFilter, SceneIndex};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::cache::GridCache;
use crate::layers::LayerState;
use crate::locator::{format_locator, parse_locator};
use crate::scene_data::{LayerSlot, SceneData, NO_DATA};
use crate::surface::{LayerImage, Presentation, ViewSurface};
use crate::{Result, ViewError};

/// Decoded grids kept across scene changes.
pub const DEFAULT_GRID_CACHE_CAPACITY: usize = 64;

/// Raw layers fetched at once for one scene.
const MAX_CONCURRENT_FETCHES: usize = 4;

/// Vertical exaggeration of the terrain view at zoom 1.
const TERRAIN_SCALE: f32 = 25.0;

/// User actions the coordinator reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Next,
    Prev,
    /// Time slider moved, `0..=1`
    SeekFraction(f64),
    /// Open one scene in the overlay, e.g. from a grid thumbnail
    Open { original_index: usize },
    ToggleMonth(u8),
    /// A label control changed in one presentation; `None` clears it.
    LabelEdit {
        source: Presentation,
        group: String,
        pos: usize,
        value: Option<String>,
    },
    SetOpacity { layer: String, opacity: f32 },
    SelectGroupLayer(String),
    SetColorScale { layer: String, scale: ColorScale },
    CloseAllLayers,
    ShowPresentation(Presentation),
}

/// Inputs for the external terrain renderer.
#[derive(Debug, Clone)]
pub struct TerrainInputs {
    pub elevation: Arc<DecodedGrid>,
    pub overlay: RgbaImage,
    pub y_scale: f32,
}

/// Everything needed to fetch one scene's raw layers, detached from the
/// controller.
pub struct LoadTicket {
    generation: u64,
    pos: usize,
    requests: Vec<(String, String)>,
    source: Arc<dyn DataSource>,
    cache: GridCache,
}

/// Fetched raw layers of one scene; `None` marks a failed layer.
#[derive(Debug, Clone)]
pub struct LoadedScene {
    generation: u64,
    pos: usize,
    grids: Vec<(String, Option<Arc<DecodedGrid>>)>,
}

impl LoadedScene {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pos(&self) -> usize {
        self.pos
    }
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Fetch and decode every raw layer. Failures never abort the scene;
    /// the layer is reported as missing instead.
    #[instrument(skip(self), fields(generation = self.generation, pos = self.pos))]
    pub async fn load(self) -> LoadedScene {
        let source = self.source;
        let cache = self.cache;
        let grids = stream::iter(self.requests)
            .map(|(layer, url)| {
                let source = source.clone();
                let cache = cache.clone();
                async move {
                    match load_grid(source.as_ref(), &cache, &url).await {
                        Ok(grid) => (layer, Some(grid)),
                        Err(e) => {
                            warn!(layer = %layer, url = %url, error = %e, "Raw layer unavailable");
                            (layer, None)
                        }
                    }
                }
            })
            .buffer_unordered(MAX_CONCURRENT_FETCHES)
            .collect::<Vec<_>>()
            .await;

        LoadedScene {
            generation: self.generation,
            pos: self.pos,
            grids,
        }
    }
}

async fn load_grid(
    source: &dyn DataSource,
    cache: &GridCache,
    url: &str,
) -> grid_codec::Result<Arc<DecodedGrid>> {
    if let Some(grid) = cache.get(url).await {
        return Ok(grid);
    }
    let grid = Arc::new(fetch_grid(source, url).await?);
    cache.insert(url.to_string(), grid.clone()).await;
    Ok(grid)
}

/// The scene currently on screen.
struct SceneView {
    scene: Scene,
    data: SceneData,
    rasters: HashMap<String, Arc<RgbaImage>>,
}

/// Coordinates navigation, filtering, labelling and layer display.
pub struct ViewController<S: ViewSurface> {
    index: SceneIndex,
    layers: LayerState,
    labels: Option<LabelStore>,
    sync: Arc<dyn LabelSync>,
    /// Started on the first label edit
    sync_queue: Option<SyncQueue>,
    colormaps: ColorMapRegistry,
    source: Arc<dyn DataSource>,
    cache: GridCache,
    terrain: Option<TerrainViewConfig>,
    generation: u64,
    current: Option<SceneView>,
    presentation: Presentation,
    surface: S,
}

impl<S: ViewSurface> ViewController<S> {
    pub fn new(manifest: SceneManifest, source: Arc<dyn DataSource>, surface: S) -> Self {
        Self {
            index: SceneIndex::new(manifest.scenes),
            layers: LayerState::new(manifest.catalog),
            labels: None,
            sync: Arc::new(NoopSync),
            sync_queue: None,
            colormaps: ColorMapRegistry::new(),
            source,
            cache: GridCache::new(DEFAULT_GRID_CACHE_CAPACITY),
            terrain: manifest.terrain_view,
            generation: 0,
            current: None,
            presentation: Presentation::Grid,
            surface,
        }
    }

    /// Enable labelling with a store and the sync to push changes through.
    pub fn with_labels(mut self, store: LabelStore, sync: Arc<dyn LabelSync>) -> Self {
        self.labels = Some(store);
        self.sync = sync;
        self.sync_queue = None;
        self
    }

    /// Share a grid cache, e.g. between controllers over the same folder.
    pub fn with_grid_cache(mut self, cache: GridCache) -> Self {
        self.cache = cache;
        self
    }

    /// First render. A locator with an index opens that scene in the
    /// overlay; otherwise the grid is shown.
    pub async fn start(&mut self, locator: Option<&str>) -> Result<()> {
        self.refresh_grid();
        match locator.and_then(parse_locator) {
            Some(original_index) => {
                self.index.seek_position(original_index.saturating_sub(1));
                self.set_presentation(Presentation::Overlay)?;
            }
            None => self.set_presentation(Presentation::Grid)?,
        }
        self.navigate().await;
        Ok(())
    }

    /// Replace the month filter and return to the first visible scene.
    pub async fn apply_filter(&mut self, filter: MonthFilter) {
        self.index.apply_filter(filter);
        self.refresh_grid();
        self.navigate().await;
    }

    /// React to one event.
    pub async fn handle(&mut self, event: ViewEvent) -> Result<()> {
        debug!(?event, "Handling view event");
        match event {
            ViewEvent::Next => {
                if self.index.next() {
                    self.navigate().await;
                }
            }
            ViewEvent::Prev => {
                if self.index.prev() {
                    self.navigate().await;
                }
            }
            ViewEvent::SeekFraction(f) => {
                let before = self.index.position();
                if self.index.seek_by_fraction(f) != before {
                    self.navigate().await;
                }
            }
            ViewEvent::Open { original_index } => {
                match self.index.seek_by_original_index(original_index) {
                    Ok(_) => {}
                    Err(IndexError::NotVisible { .. }) => {
                        let fallback = self.index.seek_nearest_original_index(original_index);
                        info!(original_index, ?fallback, "Scene filtered out, opening nearest");
                        if fallback.is_none() {
                            return Err(ViewError::NoScene);
                        }
                    }
                }
                self.set_presentation(Presentation::Overlay)?;
                self.navigate().await;
            }
            ViewEvent::ToggleMonth(month) => {
                let mut filter: MonthFilter = self.index.filter().clone();
                let excluded = filter.toggle(month);
                info!(month, excluded, "Month filter toggled");
                self.apply_filter(filter).await;
            }
            ViewEvent::LabelEdit {
                source,
                group,
                pos,
                value,
            } => {
                self.edit_label(source, &group, pos, value.as_deref())?;
            }
            ViewEvent::SetOpacity { layer, opacity } => {
                for changed in self.layers.set_opacity(&layer, opacity)? {
                    if self.layers.is_participating(&changed) {
                        let value = self.layers.opacity(&changed);
                        self.surface.set_layer_opacity(&changed, value);
                    }
                }
            }
            ViewEvent::SelectGroupLayer(layer) => {
                if self.layers.select_group_layer(&layer)?.is_some() {
                    self.draw_layers();
                }
            }
            ViewEvent::SetColorScale { layer, scale } => {
                self.set_color_scale(&layer, scale).await?;
            }
            ViewEvent::CloseAllLayers => {
                self.layers.close_all();
                let names: Vec<String> =
                    self.layers.paint_stack().iter().map(|l| l.name.clone()).collect();
                for name in names {
                    self.surface.set_layer_opacity(&name, 0.0);
                }
            }
            ViewEvent::ShowPresentation(presentation) => self.set_presentation(presentation)?,
        }
        Ok(())
    }

    /// Draw the scene under the cursor and return the fetch it still needs.
    ///
    /// Returns `None` when nothing is visible. Every call supersedes any
    /// ticket handed out earlier.
    pub fn begin_navigation(&mut self) -> Option<LoadTicket> {
        self.generation += 1;
        let Some(scene) = self.index.current().cloned() else {
            self.show_empty();
            return None;
        };
        debug!(
            generation = self.generation,
            pos = scene.pos,
            original_index = scene.original_index,
            "Navigating"
        );

        let requests = scene
            .data_srcs
            .iter()
            .map(|(layer, src)| (layer.clone(), src.url.clone()))
            .collect();
        let pos = scene.pos;
        self.current = Some(SceneView {
            data: SceneData::for_scene(&scene),
            scene,
            rasters: HashMap::new(),
        });

        self.draw_layers();
        self.surface.set_caption(&self.index.caption());
        self.surface.set_slider(self.index.slider_value());
        if let Some(view) = &self.current {
            self.surface
                .set_locator(&format_locator(view.scene.original_index));
            self.surface.set_info(&view.scene.info_rows());
        }
        self.refresh_overlay_labels();
        self.surface.set_terrain_enabled(self.terrain.is_some());

        Some(LoadTicket {
            generation: self.generation,
            pos,
            requests,
            source: self.source.clone(),
            cache: self.cache.clone(),
        })
    }

    /// Install fetched layers. Returns false when the load was superseded
    /// and discarded.
    pub fn apply_loaded(&mut self, loaded: LoadedScene) -> bool {
        if loaded.generation != self.generation {
            debug!(
                stale = loaded.generation,
                current = self.generation,
                pos = loaded.pos,
                "Discarding superseded scene load"
            );
            return false;
        }
        let Some(view) = self.current.as_mut() else {
            return false;
        };

        for (layer, grid) in loaded.grids {
            let slot = match grid {
                Some(grid) => LayerSlot::Loaded(grid),
                None => LayerSlot::Missing,
            };
            view.data.set_slot(&layer, slot);
        }

        let scaled: Vec<(String, ColorScale)> = self
            .layers
            .color_scales()
            .map(|(layer, scale)| (layer.to_string(), scale.clone()))
            .collect();
        for (layer, scale) in scaled {
            self.rasterize(&layer, &scale);
        }
        true
    }

    async fn navigate(&mut self) {
        if let Some(ticket) = self.begin_navigation() {
            let loaded = ticket.load().await;
            self.apply_loaded(loaded);
        }
    }

    fn show_empty(&mut self) {
        self.current = None;
        self.surface.clear_layers();
        self.surface.set_caption(&self.index.caption());
        self.surface.set_slider(self.index.slider_value());
        self.surface.set_info(&[]);
        self.surface.set_terrain_enabled(false);
    }

    /// Replace the drawn layer stack for the current scene.
    fn draw_layers(&mut self) {
        self.surface.clear_layers();
        let Some(view) = &self.current else {
            return;
        };
        for layer in self.layers.paint_stack() {
            let image = match view.rasters.get(&layer.name) {
                Some(raster) => LayerImage::Rendered(raster.clone()),
                None => match view.scene.image_srcs.get(&layer.name) {
                    Some(url) => LayerImage::Url(url.clone()),
                    None => continue,
                },
            };
            self.surface
                .set_layer_image(&layer.name, image, self.layers.opacity(&layer.name));
        }
    }

    /// Rasterize a data layer of the current scene with its color scale.
    fn rasterize(&mut self, layer: &str, scale: &ColorScale) {
        let Some(view) = self.current.as_mut() else {
            return;
        };
        let Some(grid) = view.data.grid(layer).cloned() else {
            debug!(layer = %layer, "No grid to rasterize, keeping pre-rendered image");
            return;
        };
        let cmap = match self.colormaps.get(&scale.cmap) {
            Ok(cmap) => cmap,
            Err(e) => {
                warn!(layer = %layer, error = %e, "Cannot rasterize layer");
                return;
            }
        };
        let raster = Arc::new(to_image(&grid, &cmap, scale.vmin, scale.vmax));
        view.rasters.insert(layer.to_string(), raster.clone());
        if self.layers.is_participating(layer) {
            self.surface.set_layer_image(
                layer,
                LayerImage::Rendered(raster),
                self.layers.opacity(layer),
            );
        }
    }

    async fn set_color_scale(&mut self, layer: &str, scale: ColorScale) -> Result<()> {
        let info = self
            .layers
            .catalog()
            .get(layer)
            .ok_or_else(|| ViewError::UnknownLayer(layer.to_string()))?;
        if !info.has_data {
            return Err(ViewError::NotDataLayer(layer.to_string()));
        }

        self.colormaps
            .load(self.source.as_ref(), &scale.cmap)
            .await?;
        let cmap = self.colormaps.get(&scale.cmap)?;
        self.layers.set_color_scale(layer, scale.clone())?;

        let legend = to_legend(&cmap, scale.vmin, scale.vmax, LEGEND_HEIGHT, LEGEND_WIDTH);
        self.surface.set_legend(layer, Arc::new(legend));
        info!(
            layer = %layer,
            cmap = %scale.cmap,
            vmin = scale.vmin,
            vmax = scale.vmax,
            "Color scale set"
        );

        self.rasterize(layer, &scale);
        Ok(())
    }

    fn set_presentation(&mut self, presentation: Presentation) -> Result<()> {
        if presentation == Presentation::Terrain && self.terrain.is_none() {
            return Err(ViewError::TerrainUnavailable);
        }
        self.presentation = presentation;
        self.surface.show_presentation(presentation);
        Ok(())
    }

    /// Rebuild the grid presentation for the visible sequence.
    fn refresh_grid(&mut self) {
        let positions: Vec<usize> = self.index.visible().map(|s| s.pos).collect();
        self.surface.set_visible_scenes(&positions);
        let Some(store) = &self.labels else {
            return;
        };
        for pos in positions {
            for (group, value) in store.labels_for(pos) {
                self.surface
                    .set_label_control(Presentation::Grid, &group, pos, value.as_deref());
            }
        }
    }

    fn refresh_overlay_labels(&mut self) {
        let (Some(store), Some(view)) = (&self.labels, &self.current) else {
            return;
        };
        let pos = view.scene.pos;
        for (group, value) in store.labels_for(pos) {
            self.surface
                .set_label_control(Presentation::Overlay, &group, pos, value.as_deref());
        }
    }

    fn edit_label(
        &mut self,
        source: Presentation,
        group: &str,
        pos: usize,
        value: Option<&str>,
    ) -> Result<LabelChange> {
        let store = self.labels.as_mut().ok_or(ViewError::LabelsDisabled)?;
        let change = match value {
            Some(value) => store.set_label(group, pos, value)?,
            None => store.clear_label(group, pos)?,
        };

        // the grid shows every visible scene; the overlay only the current one
        if let Some(other) = source.counterpart() {
            let on_screen = match other {
                Presentation::Grid => self.index.position_of_pos(pos).is_some(),
                _ => self.current_pos() == Some(pos),
            };
            if on_screen {
                self.surface
                    .set_label_control(other, group, pos, change.value.as_deref());
            }
        }

        // pushed in the background so a slow remote never holds up the view
        let sync = &self.sync;
        let queue = self
            .sync_queue
            .get_or_insert_with(|| SyncQueue::spawn(sync.clone()));
        if !queue.submit(change.clone()) {
            warn!(group = %group, pos, "Label sync worker stopped, change kept locally");
        }
        Ok(change)
    }

    /// Wait until every label edit so far has been pushed to the remote.
    pub async fn flush_label_sync(&self) {
        if let Some(queue) = &self.sync_queue {
            queue.flush().await;
        }
    }

    /// Tooltip for a point of the current scene.
    pub fn tooltip(&self, y_frac: f64, x_frac: f64) -> String {
        match &self.current {
            Some(view) => view.data.tooltip(y_frac, x_frac),
            None => NO_DATA.to_string(),
        }
    }

    /// The current scene's participating layers flattened back to front.
    ///
    /// Pre-rendered images are fetched through the data source; a layer
    /// whose image cannot be fetched is left out.
    pub async fn combined_image(&self) -> Result<RgbaImage> {
        let view = self.current.as_ref().ok_or(ViewError::NoScene)?;

        let mut images: Vec<(Arc<RgbaImage>, f32)> = Vec::new();
        for layer in self.layers.paint_stack() {
            let opacity = self.layers.opacity(&layer.name);
            if let Some(raster) = view.rasters.get(&layer.name) {
                images.push((raster.clone(), opacity));
                continue;
            }
            let Some(url) = view.scene.image_srcs.get(&layer.name) else {
                continue;
            };
            let decoded = match self.source.fetch(url).await {
                Ok(bytes) => decode_png(&bytes),
                Err(e) => {
                    warn!(layer = %layer.name, url = %url, error = %e, "Layer image unavailable");
                    continue;
                }
            };
            match decoded {
                Ok(image) => images.push((Arc::new(image), opacity)),
                Err(e) => warn!(layer = %layer.name, url = %url, error = %e, "Layer image unreadable"),
            }
        }

        let stack: Vec<(&RgbaImage, f32)> = images
            .iter()
            .map(|(image, opacity)| (image.as_ref(), *opacity))
            .collect();
        Ok(flatten(&stack)?)
    }

    /// Elevation grid, draped overlay and vertical scale for the terrain view.
    pub async fn terrain_inputs(&self, zoom: f32) -> Result<TerrainInputs> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(ViewError::InvalidZoom(zoom));
        }
        let band = &self
            .terrain
            .as_ref()
            .ok_or(ViewError::TerrainUnavailable)?
            .elevation_band;
        let view = self.current.as_ref().ok_or(ViewError::NoScene)?;
        let elevation = view
            .data
            .grid(band)
            .cloned()
            .ok_or_else(|| ViewError::LayerUnavailable {
                layer: band.clone(),
            })?;

        Ok(TerrainInputs {
            elevation,
            overlay: self.combined_image().await?,
            y_scale: TERRAIN_SCALE / zoom,
        })
    }

    /// Observe label changes, e.g. to persist or mirror them elsewhere.
    pub fn subscribe_labels(&self) -> Option<broadcast::Receiver<LabelChange>> {
        self.labels.as_ref().map(LabelStore::subscribe)
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.current.as_ref().map(|v| &v.scene)
    }

    fn current_pos(&self) -> Option<usize> {
        self.current.as_ref().map(|v| v.scene.pos)
    }

    /// Decode state of a raw layer of the current scene.
    pub fn layer_slot(&self, layer: &str) -> Option<&LayerSlot> {
        self.current.as_ref().and_then(|v| v.data.slot(layer))
    }

    /// Rasterized image of a data layer, if it has a color scale.
    pub fn raster(&self, layer: &str) -> Option<Arc<RgbaImage>> {
        self.current
            .as_ref()
            .and_then(|v| v.rasters.get(layer).cloned())
    }

    pub fn index(&self) -> &SceneIndex {
        &self.index
    }

    pub fn layers(&self) -> &LayerState {
        &self.layers
    }

    pub fn catalog(&self) -> &LayerCatalog {
        self.layers.catalog()
    }

    pub fn labels(&self) -> Option<&LabelStore> {
        self.labels.as_ref()
    }

    pub fn colormaps(&self) -> &ColorMapRegistry {
        &self.colormaps
    }

    pub fn grid_cache(&self) -> &GridCache {
        &self.cache
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}
