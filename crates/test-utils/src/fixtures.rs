//! Common test fixtures for scene explorer tests.
//!
//! The sample collection has five 4x3 scenes and the layer stack below,
//! listed top-most first as in the manifest:
//!
//! | layer | kind | group |
//! |---|---|---|
//! | `sst` | raw data + image | |
//! | `cloud` | image | |
//! | `rgb` | image | `composites` |
//! | `false_colour` | image | `composites` |
//! | `elevation` | raw data + image | |

use explorer_common::SceneManifest;
use image::RgbaImage;
use serde_json::json;
use std::path::Path;

use crate::generators::{
    create_ramp_grid, create_solid_image, create_test_grid, create_test_image, encode_test_grid,
    encode_test_png, ramp_colormap_json,
};
use crate::MemorySource;

/// Layer identifiers of the sample collection.
pub mod layers {
    pub const SST: &str = "sst";
    pub const CLOUD: &str = "cloud";
    pub const RGB: &str = "rgb";
    pub const FALSE_COLOUR: &str = "false_colour";
    pub const ELEVATION: &str = "elevation";

    /// The one mutually exclusive group
    pub const COMPOSITES: &str = "composites";

    /// Catalog order, top-most first
    pub const ALL: [&str; 5] = [SST, CLOUD, RGB, FALSE_COLOUR, ELEVATION];
}

/// Label groups of the sample label document.
pub mod labels {
    pub const QUALITY: &str = "quality";
    pub const QUALITY_VALUES: [&str; 3] = ["good", "bad", "unsure"];
}

pub const GRID_WIDTH: usize = 4;
pub const GRID_HEIGHT: usize = 3;

/// Scene timestamps by `pos`; the last one has no parseable month.
pub const TIMESTAMPS: [&str; 5] = [
    "2020-01-15T10:00:00",
    "2020-02-03T10:00:00",
    "2020-02-17T10:00:00",
    "2020-03-09T10:00:00",
    "undated",
];

/// Name of the sample colormap, five grey levels.
pub const GREYS: &str = "greys";

/// Raw SST values for a scene: a 270..300 ramp shifted by `pos`, with the
/// top-right cell missing.
pub fn sst_values(pos: usize) -> Vec<f32> {
    let offset = pos as f32;
    let mut values = create_ramp_grid(GRID_WIDTH, GRID_HEIGHT, 270.0 + offset, 300.0 + offset);
    values[GRID_WIDTH - 1] = f32::NAN;
    values
}

/// Raw elevation values for a scene.
pub fn elevation_values(_pos: usize) -> Vec<f32> {
    create_test_grid(GRID_WIDTH, GRID_HEIGHT)
}

/// URL of a raw grid in the sample folder.
pub fn data_url(layer: &str, pos: usize) -> String {
    format!("data/{}_{}.gz", layer, pos)
}

/// URL of a pre-rendered image in the sample folder.
pub fn image_url(layer: &str, pos: usize) -> String {
    format!("images/{}_{}.png", layer, pos)
}

/// Pre-rendered image for a layer.
pub fn sample_image(layer: &str, pos: usize) -> RgbaImage {
    let (w, h) = (GRID_WIDTH as u32, GRID_HEIGHT as u32);
    match layer {
        layers::CLOUD => create_solid_image(w, h, [255, 255, 255, 128]),
        layers::RGB => create_test_image(w, h),
        layers::FALSE_COLOUR => create_solid_image(w, h, [0, 128, 0, 255]),
        layers::SST => create_solid_image(w, h, [200, 0, 0, 255]),
        _ => create_solid_image(w, h, [pos as u8 * 10, 100, 100, 255]),
    }
}

/// The sample `scenes.json` document.
pub fn sample_manifest_json() -> String {
    let index: Vec<serde_json::Value> = TIMESTAMPS
        .iter()
        .enumerate()
        .map(|(pos, ts)| {
            let image_srcs: serde_json::Map<String, serde_json::Value> = layers::ALL
                .iter()
                .map(|l| (l.to_string(), json!(image_url(l, pos))))
                .collect();
            json!({
                "timestamp": ts,
                "pos": pos,
                "image_srcs": image_srcs,
                "data_srcs": {
                    "sst": {"url": data_url(layers::SST, pos), "options": {"label": "{value} K", "fixed": 1}},
                    "elevation": {"url": data_url(layers::ELEVATION, pos), "options": {}}
                },
                "info": {"orbit": 1000 + pos, "platform": "S3A"},
                "x_min": -5.0, "x_max": 3.0, "y_min": 50.0, "y_max": 56.0
            })
        })
        .collect();

    json!({
        "layers": [
            {"name": "sst", "label": "Sea surface temperature", "has_data": true},
            {"name": "cloud", "label": "Cloud mask", "has_data": false},
            {"name": "rgb", "label": "True colour", "has_data": false},
            {"name": "false_colour", "label": "False colour", "has_data": false},
            {"name": "elevation", "label": "Elevation", "has_data": true}
        ],
        "layer_groups": {"composites": ["rgb", "false_colour"]},
        "index": index,
        "terrain_view": {"elevation_band": "elevation"},
        "data_width": GRID_WIDTH,
        "data_height": GRID_HEIGHT
    })
    .to_string()
}

/// The sample manifest, parsed.
pub fn sample_manifest() -> SceneManifest {
    SceneManifest::from_json(sample_manifest_json().as_bytes())
        .expect("sample manifest is valid")
}

/// The sample `labels.json` document: scene 1 is labelled `bad`.
pub fn sample_labels_json() -> String {
    let mut values = vec![serde_json::Value::Null; TIMESTAMPS.len()];
    values[1] = json!("bad");
    json!({
        "case_dimension": "time",
        "schema": {"quality": labels::QUALITY_VALUES},
        "values": {"quality": values}
    })
    .to_string()
}

/// Every file of the sample folder as `(relative url, bytes)`.
pub fn sample_files() -> Vec<(String, Vec<u8>)> {
    let mut files = vec![
        ("scenes.json".to_string(), sample_manifest_json().into_bytes()),
        ("labels.json".to_string(), sample_labels_json().into_bytes()),
        (format!("cmaps/{}.json", GREYS), ramp_colormap_json(5).into_bytes()),
    ];
    for pos in 0..TIMESTAMPS.len() {
        files.push((
            data_url(layers::SST, pos),
            encode_test_grid(GRID_WIDTH, GRID_HEIGHT, &sst_values(pos)),
        ));
        files.push((
            data_url(layers::ELEVATION, pos),
            encode_test_grid(GRID_WIDTH, GRID_HEIGHT, &elevation_values(pos)),
        ));
        for layer in layers::ALL {
            files.push((image_url(layer, pos), encode_test_png(&sample_image(layer, pos))));
        }
    }
    files
}

/// A [`MemorySource`] holding the whole sample folder.
pub fn sample_source() -> MemorySource {
    let source = MemorySource::new();
    for (url, bytes) in sample_files() {
        source.insert(&url, bytes);
    }
    source
}

/// Write the sample folder under `dir`.
pub fn write_scene_folder(dir: &Path) -> std::io::Result<()> {
    for (url, bytes) in sample_files() {
        let path = dir.join(&url);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
    }
    Ok(())
}
