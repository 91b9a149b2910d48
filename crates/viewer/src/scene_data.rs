//! Raw data layers of the displayed scene and point queries against them.

use explorer_common::{LayerOptions, Scene};
use grid_codec::DecodedGrid;
use std::sync::Arc;

/// Text shown when no scene data is available at all.
pub const NO_DATA: &str = "No Data";

/// Text shown for a layer whose grid has not arrived yet.
pub const LOADING: &str = "[loading]";

/// Decode state of one raw layer.
#[derive(Debug, Clone)]
pub enum LayerSlot {
    Loading,
    Loaded(Arc<DecodedGrid>),
    /// Fetch or decode failed; every query reads as missing.
    Missing,
}

#[derive(Debug, Clone)]
struct DataLayer {
    name: String,
    options: LayerOptions,
    slot: LayerSlot,
}

/// Raw layers registered for one scene, in registration order.
#[derive(Debug, Clone)]
pub struct SceneData {
    pos: usize,
    layers: Vec<DataLayer>,
}

impl SceneData {
    /// Register every raw layer of `scene`, all still loading.
    pub fn for_scene(scene: &Scene) -> Self {
        let layers = scene
            .data_srcs
            .iter()
            .map(|(name, src)| DataLayer {
                name: name.clone(),
                options: src.options.clone(),
                slot: LayerSlot::Loading,
            })
            .collect();
        Self {
            pos: scene.pos,
            layers,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Record the outcome for a layer. Unregistered names are ignored.
    pub fn set_slot(&mut self, layer: &str, slot: LayerSlot) {
        if let Some(entry) = self.layers.iter_mut().find(|l| l.name == layer) {
            entry.slot = slot;
        }
    }

    pub fn slot(&self, layer: &str) -> Option<&LayerSlot> {
        self.layers.iter().find(|l| l.name == layer).map(|l| &l.slot)
    }

    pub fn grid(&self, layer: &str) -> Option<&Arc<DecodedGrid>> {
        match self.slot(layer) {
            Some(LayerSlot::Loaded(grid)) => Some(grid),
            _ => None,
        }
    }

    /// Whether no layer is still loading.
    pub fn is_settled(&self) -> bool {
        !self
            .layers
            .iter()
            .any(|l| matches!(l.slot, LayerSlot::Loading))
    }

    /// Value of one layer at row `y`, column `x`.
    ///
    /// `None` for a missing layer or out-of-range cell; NaN when the cell
    /// itself holds no data.
    pub fn value(&self, layer: &str, y: usize, x: usize) -> Option<f32> {
        self.grid(layer).and_then(|g| g.get(y, x))
    }

    /// One line per raw layer for the point at the given map fractions.
    ///
    /// `y_frac` runs bottom to top, so it is flipped onto grid rows.
    pub fn tooltip_lines(&self, y_frac: f64, x_frac: f64) -> Vec<String> {
        self.layers
            .iter()
            .map(|layer| match &layer.slot {
                LayerSlot::Loading => layer.options.label_template.replace("{value}", LOADING),
                LayerSlot::Missing => layer.options.format_value(None),
                LayerSlot::Loaded(grid) => {
                    let x = cell_index(x_frac, grid.width());
                    let y = cell_index(1.0 - y_frac, grid.height());
                    layer.options.format_value(grid.get(y, x))
                }
            })
            .collect()
    }

    /// Tooltip text for a point, one layer per line.
    pub fn tooltip(&self, y_frac: f64, x_frac: f64) -> String {
        let lines = self.tooltip_lines(y_frac, x_frac);
        if lines.is_empty() {
            NO_DATA.to_string()
        } else {
            lines.join("\n")
        }
    }
}

/// `floor(frac * len)` clamped into `0..len`.
fn cell_index(frac: f64, len: usize) -> usize {
    if !frac.is_finite() || frac <= 0.0 {
        return 0;
    }
    ((frac * len as f64).floor() as usize).min(len.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{layers, sample_manifest, sst_values, GRID_HEIGHT, GRID_WIDTH};

    fn loaded(pos: usize) -> SceneData {
        let manifest = sample_manifest();
        let mut data = SceneData::for_scene(&manifest.scenes[pos]);
        let grid = DecodedGrid::new(GRID_WIDTH, GRID_HEIGHT, sst_values(pos)).unwrap();
        data.set_slot(layers::SST, LayerSlot::Loaded(Arc::new(grid)));
        data
    }

    #[test]
    fn test_cell_index_clamps() {
        assert_eq!(cell_index(0.0, 4), 0);
        assert_eq!(cell_index(0.49, 4), 1);
        assert_eq!(cell_index(1.0, 4), 3);
        assert_eq!(cell_index(-0.2, 4), 0);
        assert_eq!(cell_index(f64::NAN, 4), 0);
    }

    #[test]
    fn test_tooltip_formats_and_flips_rows() {
        let data = loaded(0);
        // bottom-left of the map is the last grid row
        let lines = data.tooltip_lines(0.0, 0.0);
        let expected = sst_values(0)[(GRID_HEIGHT - 1) * GRID_WIDTH];
        // data layers register alphabetically: elevation, then sst
        assert_eq!(lines[0], LOADING);
        assert_eq!(lines[1], format!("{:.1} K", expected));
    }

    #[test]
    fn test_tooltip_missing_cell_and_layer() {
        let mut data = loaded(0);
        data.set_slot(layers::ELEVATION, LayerSlot::Missing);
        // top-right cell is NaN in the sst fixture
        let lines = data.tooltip_lines(0.99, 0.99);
        assert_eq!(lines, vec!["(missing)".to_string(), "(missing) K".to_string()]);
        assert!(data.is_settled());
    }

    #[test]
    fn test_tooltip_without_layers() {
        let mut scene = sample_manifest().scenes[0].clone();
        scene.data_srcs.clear();
        assert_eq!(SceneData::for_scene(&scene).tooltip(0.5, 0.5), NO_DATA);
    }
}
