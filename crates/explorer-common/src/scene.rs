//! Scenes: one time-stamped multi-layer observation unit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::LayerOptions;

/// Where to fetch a raw grid for one layer, and how to display its values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceRef {
    pub url: String,
    #[serde(default)]
    pub options: LayerOptions,
}

/// A scene as listed in the manifest index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Timestamp text; characters 5-6 hold the two-digit month
    #[serde(default)]
    pub timestamp: String,

    /// Stable identity used to key label storage
    pub pos: usize,

    /// 1-based position in the unfiltered collection, stamped at load
    #[serde(skip)]
    pub original_index: usize,

    /// Layer name -> pre-rendered image reference
    #[serde(default)]
    pub image_srcs: BTreeMap<String, String>,

    /// Layer name -> raw grid descriptor
    #[serde(default)]
    pub data_srcs: BTreeMap<String, DataSourceRef>,

    /// Key -> display value for the info panel
    #[serde(default)]
    pub info: BTreeMap<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_max: Option<f64>,
}

impl Scene {
    /// Month number (1-12) parsed from the timestamp, if present.
    pub fn month(&self) -> Option<u8> {
        self.timestamp
            .get(5..7)
            .and_then(|m| m.parse::<u8>().ok())
            .filter(|m| (1..=12).contains(m))
    }

    /// Year parsed from the first four characters of the timestamp.
    pub fn year(&self) -> Option<i32> {
        self.timestamp.get(0..4).and_then(|y| y.parse().ok())
    }

    /// Names of every layer this scene references.
    pub fn referenced_layers(&self) -> impl Iterator<Item = &str> {
        self.image_srcs
            .keys()
            .chain(self.data_srcs.keys())
            .map(String::as_str)
    }

    /// Info values rendered as display text.
    pub fn info_rows(&self) -> Vec<(String, String)> {
        self.info
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), text)
            })
            .collect()
    }
}
