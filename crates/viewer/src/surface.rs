//! The render seam between the coordinator and whatever draws.
//!
//! A map widget, a thumbnail grid, a 3-D terrain view: the coordinator
//! never touches any of them directly. It issues instructions through
//! [`ViewSurface`] and keeps no widget state of its own.

use image::RgbaImage;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// The two scene presentations plus the optional terrain view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presentation {
    /// Every visible scene as a thumbnail with its label controls
    Grid,
    /// One scene at a time on the map
    Overlay,
    /// Elevation-driven 3-D view of the current scene
    Terrain,
}

impl Presentation {
    /// The other scene presentation, for label mirroring.
    pub fn counterpart(self) -> Option<Presentation> {
        match self {
            Presentation::Grid => Some(Presentation::Overlay),
            Presentation::Overlay => Some(Presentation::Grid),
            Presentation::Terrain => None,
        }
    }
}

impl fmt::Display for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presentation::Grid => write!(f, "grid"),
            Presentation::Overlay => write!(f, "overlay"),
            Presentation::Terrain => write!(f, "terrain"),
        }
    }
}

/// What to draw for one layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerImage {
    /// Pre-rendered image, addressed relative to the scene folder
    Url(String),
    /// Image rasterized from raw data with a chosen colormap
    Rendered(Arc<RgbaImage>),
}

/// Render instructions issued by the coordinator.
pub trait ViewSurface {
    fn show_presentation(&mut self, presentation: Presentation);

    /// Remove every overlay layer before a new scene is drawn.
    fn clear_layers(&mut self);

    fn set_layer_image(&mut self, layer: &str, image: LayerImage, opacity: f32);

    fn set_layer_opacity(&mut self, layer: &str, opacity: f32);

    fn set_legend(&mut self, layer: &str, legend: Arc<RgbaImage>);

    fn set_caption(&mut self, caption: &str);

    /// Slider position in `0..=100`.
    fn set_slider(&mut self, value: f64);

    /// Shareable locator for the current scene, e.g. `?index=12`.
    fn set_locator(&mut self, locator: &str);

    fn set_info(&mut self, rows: &[(String, String)]);

    /// Show `value` in the label control for `(group, pos)` of one presentation.
    fn set_label_control(
        &mut self,
        presentation: Presentation,
        group: &str,
        pos: usize,
        value: Option<&str>,
    );

    /// `pos` of every scene currently in the grid, in order.
    fn set_visible_scenes(&mut self, positions: &[usize]);

    fn set_terrain_enabled(&mut self, enabled: bool);
}

/// Surface that only logs, for headless runs.
#[derive(Debug, Default)]
pub struct TracingSurface;

impl ViewSurface for TracingSurface {
    fn show_presentation(&mut self, presentation: Presentation) {
        info!(%presentation, "Show presentation");
    }

    fn clear_layers(&mut self) {}

    fn set_layer_image(&mut self, layer: &str, image: LayerImage, opacity: f32) {
        match image {
            LayerImage::Url(url) => info!(layer = %layer, url = %url, opacity, "Layer image"),
            LayerImage::Rendered(img) => info!(
                layer = %layer,
                width = img.width(),
                height = img.height(),
                opacity,
                "Layer rendered"
            ),
        }
    }

    fn set_layer_opacity(&mut self, layer: &str, opacity: f32) {
        info!(layer = %layer, opacity, "Layer opacity");
    }

    fn set_legend(&mut self, layer: &str, legend: Arc<RgbaImage>) {
        info!(layer = %layer, width = legend.width(), "Legend");
    }

    fn set_caption(&mut self, caption: &str) {
        info!(caption = %caption, "Caption");
    }

    fn set_slider(&mut self, _value: f64) {}

    fn set_locator(&mut self, locator: &str) {
        info!(locator = %locator, "Locator");
    }

    fn set_info(&mut self, rows: &[(String, String)]) {
        for (key, value) in rows {
            info!(key = %key, value = %value, "Scene info");
        }
    }

    fn set_label_control(
        &mut self,
        presentation: Presentation,
        group: &str,
        pos: usize,
        value: Option<&str>,
    ) {
        info!(%presentation, group = %group, pos, value = ?value, "Label");
    }

    fn set_visible_scenes(&mut self, positions: &[usize]) {
        info!(count = positions.len(), "Visible scenes");
    }

    fn set_terrain_enabled(&mut self, enabled: bool) {
        info!(enabled, "Terrain view");
    }
}
