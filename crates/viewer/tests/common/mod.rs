//! Shared helpers for viewer integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use image::RgbaImage;
use labels::{LabelDocument, LabelError, LabelStore, LabelSync, NoopSync};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use test_utils::{sample_labels_json, sample_manifest, sample_source, MemorySource};
use viewer::{LayerImage, Presentation, ViewController, ViewSurface};

/// One label control write.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelWrite {
    pub presentation: Presentation,
    pub group: String,
    pub pos: usize,
    pub value: Option<String>,
}

/// Surface that keeps the latest state of every widget.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub presentation: Option<Presentation>,
    pub stack: Vec<(String, LayerImage, f32)>,
    pub clears: usize,
    pub legends: HashMap<String, Arc<RgbaImage>>,
    pub caption: String,
    pub slider: f64,
    pub locator: String,
    pub info: Vec<(String, String)>,
    pub label_writes: Vec<LabelWrite>,
    pub visible: Vec<usize>,
    pub terrain_enabled: bool,
}

impl RecordingSurface {
    pub fn layer(&self, name: &str) -> Option<&(String, LayerImage, f32)> {
        self.stack.iter().find(|(n, _, _)| n == name)
    }

    pub fn stack_names(&self) -> Vec<&str> {
        self.stack.iter().map(|(n, _, _)| n.as_str()).collect()
    }

    pub fn writes_to(&self, presentation: Presentation) -> Vec<&LabelWrite> {
        self.label_writes
            .iter()
            .filter(|w| w.presentation == presentation)
            .collect()
    }
}

impl ViewSurface for RecordingSurface {
    fn show_presentation(&mut self, presentation: Presentation) {
        self.presentation = Some(presentation);
    }

    fn clear_layers(&mut self) {
        self.stack.clear();
        self.clears += 1;
    }

    fn set_layer_image(&mut self, layer: &str, image: LayerImage, opacity: f32) {
        match self.stack.iter_mut().find(|(n, _, _)| n == layer) {
            Some(entry) => *entry = (layer.to_string(), image, opacity),
            None => self.stack.push((layer.to_string(), image, opacity)),
        }
    }

    fn set_layer_opacity(&mut self, layer: &str, opacity: f32) {
        if let Some(entry) = self.stack.iter_mut().find(|(n, _, _)| n == layer) {
            entry.2 = opacity;
        }
    }

    fn set_legend(&mut self, layer: &str, legend: Arc<RgbaImage>) {
        self.legends.insert(layer.to_string(), legend);
    }

    fn set_caption(&mut self, caption: &str) {
        self.caption = caption.to_string();
    }

    fn set_slider(&mut self, value: f64) {
        self.slider = value;
    }

    fn set_locator(&mut self, locator: &str) {
        self.locator = locator.to_string();
    }

    fn set_info(&mut self, rows: &[(String, String)]) {
        self.info = rows.to_vec();
    }

    fn set_label_control(
        &mut self,
        presentation: Presentation,
        group: &str,
        pos: usize,
        value: Option<&str>,
    ) {
        self.label_writes.push(LabelWrite {
            presentation,
            group: group.to_string(),
            pos,
            value: value.map(str::to_string),
        });
    }

    fn set_visible_scenes(&mut self, positions: &[usize]) {
        self.visible = positions.to_vec();
    }

    fn set_terrain_enabled(&mut self, enabled: bool) {
        self.terrain_enabled = enabled;
    }
}

/// Label sync that records pushes and can be told to fail.
#[derive(Default)]
pub struct RecordingSync {
    pub pushes: Mutex<Vec<(String, usize, Option<String>)>>,
    pub failing: bool,
}

#[async_trait]
impl LabelSync for RecordingSync {
    async fn push(&self, group: &str, pos: usize, value: Option<&str>) -> labels::Result<()> {
        self.pushes
            .lock()
            .unwrap()
            .push((group.to_string(), pos, value.map(str::to_string)));
        if self.failing {
            return Err(LabelError::sync("remote unavailable"));
        }
        Ok(())
    }
}

pub fn sample_store() -> LabelStore {
    let doc = LabelDocument::from_json(sample_labels_json().as_bytes()).unwrap();
    LabelStore::new(doc, sample_manifest().scenes.len()).unwrap()
}

/// Controller over the sample folder with labels and no remote sync.
pub fn controller() -> (ViewController<RecordingSurface>, Arc<MemorySource>) {
    controller_with_sync(Arc::new(NoopSync))
}

/// Sync whose every push waits for `gate` before it is recorded.
#[derive(Default)]
pub struct GatedSync {
    pub gate: Notify,
    pub pushes: Mutex<Vec<(String, usize, Option<String>)>>,
}

#[async_trait]
impl LabelSync for GatedSync {
    async fn push(&self, group: &str, pos: usize, value: Option<&str>) -> labels::Result<()> {
        self.gate.notified().await;
        self.pushes
            .lock()
            .unwrap()
            .push((group.to_string(), pos, value.map(str::to_string)));
        Ok(())
    }
}

pub fn controller_with_sync(
    sync: Arc<dyn LabelSync>,
) -> (ViewController<RecordingSurface>, Arc<MemorySource>) {
    let source = Arc::new(sample_source());
    let controller = ViewController::new(
        sample_manifest(),
        source.clone(),
        RecordingSurface::default(),
    )
    .with_labels(sample_store(), sync);
    (controller, source)
}

/// Controller over a prepared source, without labels.
pub fn controller_over(source: Arc<MemorySource>) -> ViewController<RecordingSurface> {
    ViewController::new(sample_manifest(), source, RecordingSurface::default())
}
