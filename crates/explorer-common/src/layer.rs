//! Layer catalog and per-layer display options.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::{ManifestError, ManifestResult};

/// Placeholder replaced by the formatted value in a tooltip template.
pub const VALUE_PLACEHOLDER: &str = "{value}";

/// Upper bound on decimal places accepted for tooltip values.
pub const MAX_FIXED_DIGITS: usize = 20;

/// A named raster channel as listed in the manifest catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    /// Unique layer key
    pub name: String,

    /// Human-readable label shown next to layer controls
    #[serde(default)]
    pub label: String,

    /// Whether a raw numeric layer exists for point queries
    #[serde(default)]
    pub has_data: bool,

    /// External map-service template, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wms_url: Option<String>,
}

/// Display options for a raw data layer.
///
/// On the wire these arrive as an optional bag `{"label": .., "fixed": ..}`
/// inside each data source; they are resolved into this record once, at
/// manifest load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerOptions {
    #[serde(rename = "label", default = "default_label_template")]
    pub label_template: String,

    #[serde(rename = "fixed", default = "default_fixed_digits")]
    pub fixed_digits: usize,
}

fn default_label_template() -> String {
    VALUE_PLACEHOLDER.to_string()
}

fn default_fixed_digits() -> usize {
    2
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            label_template: default_label_template(),
            fixed_digits: default_fixed_digits(),
        }
    }
}

impl LayerOptions {
    /// Check the options for the named layer.
    pub fn validate(&self, layer: &str) -> ManifestResult<()> {
        if self.fixed_digits > MAX_FIXED_DIGITS {
            return Err(ManifestError::invalid_options(
                layer,
                format!(
                    "fixed digits {} exceeds maximum of {}",
                    self.fixed_digits, MAX_FIXED_DIGITS
                ),
            ));
        }
        if !self.label_template.contains(VALUE_PLACEHOLDER) {
            return Err(ManifestError::invalid_options(
                layer,
                format!("label template '{}' has no {}", self.label_template, VALUE_PLACEHOLDER),
            ));
        }
        Ok(())
    }

    /// Render a value through the template.
    ///
    /// `None` and NaN both render as `(missing)`.
    pub fn format_value(&self, value: Option<f32>) -> String {
        let text = match value {
            Some(v) if !v.is_nan() => format!("{:.*}", self.fixed_digits, v),
            _ => "(missing)".to_string(),
        };
        self.label_template.replace(VALUE_PLACEHOLDER, &text)
    }
}

/// The validated layer catalog: layers in manifest order plus group membership.
///
/// Manifest order lists the top-most layer first, so painting walks the
/// catalog in reverse.
#[derive(Debug, Clone, Default)]
pub struct LayerCatalog {
    layers: Vec<LayerInfo>,
    groups: BTreeMap<String, Vec<String>>,
    group_of: HashMap<String, String>,
}

impl LayerCatalog {
    /// Build a catalog, enforcing unique names and single-group membership.
    pub fn new(
        layers: Vec<LayerInfo>,
        groups: BTreeMap<String, Vec<String>>,
    ) -> ManifestResult<Self> {
        let mut seen = HashMap::new();
        for layer in &layers {
            if seen.insert(layer.name.clone(), ()).is_some() {
                return Err(ManifestError::DuplicateLayer(layer.name.clone()));
            }
        }

        let mut group_of: HashMap<String, String> = HashMap::new();
        for (group, members) in &groups {
            for member in members {
                if !seen.contains_key(member) {
                    return Err(ManifestError::UnknownGroupMember {
                        group: group.clone(),
                        layer: member.clone(),
                    });
                }
                if let Some(existing) = group_of.get(member) {
                    if existing != group {
                        return Err(ManifestError::LayerInMultipleGroups {
                            layer: member.clone(),
                            first: existing.clone(),
                            second: group.clone(),
                        });
                    }
                }
                group_of.insert(member.clone(), group.clone());
            }
        }

        Ok(Self {
            layers,
            groups,
            group_of,
        })
    }

    /// Layers in manifest order (top-most first).
    pub fn layers(&self) -> &[LayerInfo] {
        &self.layers
    }

    /// Layers in paint order (back to front).
    pub fn paint_order(&self) -> impl Iterator<Item = &LayerInfo> {
        self.layers.iter().rev()
    }

    pub fn get(&self, name: &str) -> Option<&LayerInfo> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Group the layer belongs to, if any.
    pub fn group_of(&self, name: &str) -> Option<&str> {
        self.group_of.get(name).map(String::as_str)
    }

    /// Members of a group in declaration order.
    pub fn group_members(&self, group: &str) -> &[String] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn groups(&self) -> &BTreeMap<String, Vec<String>> {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
