//! Per-layer display state: opacity, active member per group, dynamic
//! colormap choice.

use explorer_common::{LayerCatalog, LayerInfo};
use renderer::ColorScale;
use std::collections::HashMap;

use crate::{Result, ViewError};

/// Display state for every layer in the catalog.
///
/// All layers start fully opaque. Within a group exactly one member is
/// active (initially the first in manifest order) and members share one
/// opacity.
#[derive(Debug, Clone)]
pub struct LayerState {
    catalog: LayerCatalog,
    opacity: HashMap<String, f32>,
    active: HashMap<String, String>,
    scales: HashMap<String, ColorScale>,
}

impl LayerState {
    pub fn new(catalog: LayerCatalog) -> Self {
        let opacity = catalog
            .layers()
            .iter()
            .map(|l| (l.name.clone(), 1.0))
            .collect();
        let active = catalog
            .groups()
            .iter()
            .filter_map(|(group, members)| {
                // first member in manifest order, not in group-list order
                catalog
                    .layers()
                    .iter()
                    .find(|l| members.contains(&l.name))
                    .map(|l| (group.clone(), l.name.clone()))
            })
            .collect();
        Self {
            catalog,
            opacity,
            active,
            scales: HashMap::new(),
        }
    }

    pub fn catalog(&self) -> &LayerCatalog {
        &self.catalog
    }

    fn info(&self, layer: &str) -> Result<&LayerInfo> {
        self.catalog
            .get(layer)
            .ok_or_else(|| ViewError::UnknownLayer(layer.to_string()))
    }

    /// Layers that share `layer`'s display slot, itself included.
    fn slot_members(&self, layer: &str) -> Vec<String> {
        match self.catalog.group_of(layer) {
            Some(group) => self.catalog.group_members(group).to_vec(),
            None => vec![layer.to_string()],
        }
    }

    /// Configured opacity, regardless of group activity.
    pub fn opacity(&self, layer: &str) -> f32 {
        self.opacity.get(layer).copied().unwrap_or(0.0)
    }

    /// Set a layer's opacity, mirrored to the rest of its group.
    ///
    /// Returns every layer whose opacity changed.
    pub fn set_opacity(&mut self, layer: &str, opacity: f32) -> Result<Vec<String>> {
        self.info(layer)?;
        let opacity = if opacity.is_nan() {
            0.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
        let members = self.slot_members(layer);
        for member in &members {
            self.opacity.insert(member.clone(), opacity);
        }
        Ok(members)
    }

    /// Make `layer` the active member of its group.
    ///
    /// Returns the group name, or `None` for an ungrouped layer (which is
    /// always active).
    pub fn select_group_layer(&mut self, layer: &str) -> Result<Option<String>> {
        self.info(layer)?;
        let Some(group) = self.catalog.group_of(layer).map(str::to_string) else {
            return Ok(None);
        };
        self.active.insert(group.clone(), layer.to_string());
        Ok(Some(group))
    }

    /// Active member of a group.
    pub fn active_in_group(&self, group: &str) -> Option<&str> {
        self.active.get(group).map(String::as_str)
    }

    /// Hide every layer.
    pub fn close_all(&mut self) {
        for value in self.opacity.values_mut() {
            *value = 0.0;
        }
    }

    /// Whether the layer is drawn at all: ungrouped, or active in its group.
    pub fn is_participating(&self, layer: &str) -> bool {
        match self.catalog.group_of(layer) {
            Some(group) => self.active_in_group(group) == Some(layer),
            None => self.catalog.contains(layer),
        }
    }

    /// Opacity as drawn: zero for inactive group members.
    pub fn effective_opacity(&self, layer: &str) -> f32 {
        if self.is_participating(layer) {
            self.opacity(layer)
        } else {
            0.0
        }
    }

    /// Participating layers, back to front.
    pub fn paint_stack(&self) -> Vec<&LayerInfo> {
        self.catalog
            .paint_order()
            .filter(|l| self.is_participating(&l.name))
            .collect()
    }

    /// Choose a dynamic colormap for a raw data layer.
    pub fn set_color_scale(&mut self, layer: &str, scale: ColorScale) -> Result<()> {
        if !self.info(layer)?.has_data {
            return Err(ViewError::NotDataLayer(layer.to_string()));
        }
        self.scales.insert(layer.to_string(), scale);
        Ok(())
    }

    pub fn color_scale(&self, layer: &str) -> Option<&ColorScale> {
        self.scales.get(layer)
    }

    pub fn color_scales(&self) -> impl Iterator<Item = (&str, &ColorScale)> {
        self.scales.iter().map(|(k, v)| (k.as_str(), v))
    }
}
