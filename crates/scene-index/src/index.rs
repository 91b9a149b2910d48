//! The filtered scene sequence and its cursor.

use explorer_common::Scene;
use std::sync::Arc;
use tracing::debug;

use crate::{IndexError, MonthFilter, Result};

/// Filtered view over a shared scene list.
///
/// `current` is an index into `visible`; it is only meaningful while
/// `visible` is non-empty, and every mutation keeps it in range.
#[derive(Debug, Clone)]
pub struct SceneIndex {
    scenes: Arc<[Scene]>,
    filter: MonthFilter,
    visible: Vec<usize>,
    current: usize,
}

impl SceneIndex {
    /// Index over all scenes with no months excluded.
    pub fn new(scenes: impl Into<Arc<[Scene]>>) -> Self {
        let scenes = scenes.into();
        let visible = (0..scenes.len()).collect();
        Self {
            scenes,
            filter: MonthFilter::new(),
            visible,
            current: 0,
        }
    }

    /// Recompute the visible sequence and reset the cursor to the start.
    pub fn apply_filter(&mut self, filter: MonthFilter) {
        self.visible = self
            .scenes
            .iter()
            .enumerate()
            .filter(|(_, scene)| filter.admits(scene))
            .map(|(i, _)| i)
            .collect();
        self.filter = filter;
        self.current = 0;
        debug!(
            visible = self.visible.len(),
            total = self.scenes.len(),
            "Applied month filter"
        );
    }

    pub fn filter(&self) -> &MonthFilter {
        &self.filter
    }

    /// Step forward. Returns false at the end of the sequence.
    pub fn next(&mut self) -> bool {
        if self.current + 1 < self.visible.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Step back. Returns false at the start of the sequence.
    pub fn prev(&mut self) -> bool {
        if self.current > 0 && !self.visible.is_empty() {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Move to `round(f * (len - 1))`, with `f` clamped to `0..=1`.
    ///
    /// Returns the new position, or `None` when nothing is visible.
    pub fn seek_by_fraction(&mut self, f: f64) -> Option<usize> {
        let last = self.visible.len().checked_sub(1)?;
        let f = if f.is_nan() { 0.0 } else { f.clamp(0.0, 1.0) };
        self.current = ((f * last as f64).round() as usize).min(last);
        Some(self.current)
    }

    /// Move to a position in the visible sequence, clamped into range.
    pub fn seek_position(&mut self, position: usize) -> Option<usize> {
        let last = self.visible.len().checked_sub(1)?;
        self.current = position.min(last);
        Some(self.current)
    }

    /// Move to the visible scene with the given original index.
    pub fn seek_by_original_index(&mut self, original_index: usize) -> Result<usize> {
        let position = self
            .position_of_original_index(original_index)
            .ok_or(IndexError::NotVisible { original_index })?;
        self.current = position;
        Ok(position)
    }

    /// Move to the given original index if visible, otherwise to the
    /// visible scene whose original index is closest (earlier wins a tie).
    pub fn seek_nearest_original_index(&mut self, original_index: usize) -> Option<usize> {
        let position = self
            .visible
            .iter()
            .enumerate()
            .min_by_key(|&(_, &i)| self.scenes[i].original_index.abs_diff(original_index))
            .map(|(p, _)| p)?;
        self.current = position;
        Some(position)
    }

    /// Position of a scene in the visible sequence.
    pub fn position_of_original_index(&self, original_index: usize) -> Option<usize> {
        self.visible
            .iter()
            .position(|&i| self.scenes[i].original_index == original_index)
    }

    /// Position of the scene with stable identity `pos`.
    pub fn position_of_pos(&self, pos: usize) -> Option<usize> {
        self.visible.iter().position(|&i| self.scenes[i].pos == pos)
    }

    /// The scene under the cursor.
    pub fn current(&self) -> Option<&Scene> {
        self.visible.get(self.current).map(|&i| &self.scenes[i])
    }

    /// The cursor, or `None` when nothing is visible.
    pub fn position(&self) -> Option<usize> {
        (!self.visible.is_empty()).then_some(self.current)
    }

    pub fn scene_at(&self, position: usize) -> Option<&Scene> {
        self.visible.get(position).map(|&i| &self.scenes[i])
    }

    /// Visible scenes in order.
    pub fn visible(&self) -> impl Iterator<Item = &Scene> + '_ {
        self.visible.iter().map(move |&i| &self.scenes[i])
    }

    /// Every scene, filtered or not.
    pub fn all_scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Time slider value in `0..=100`: 50 when empty, 0 for a single scene.
    pub fn slider_value(&self) -> f64 {
        match self.visible.len() {
            0 => 50.0,
            1 => 0.0,
            n => 100.0 * self.current as f64 / (n - 1) as f64,
        }
    }

    /// Overlay caption: `(i/n) timestamp`, or `0/0` when empty.
    pub fn caption(&self) -> String {
        match self.current() {
            Some(scene) => format!(
                "({}/{}) {}",
                self.current + 1,
                self.visible.len(),
                scene.timestamp
            ),
            None => "0/0".to_string(),
        }
    }
}
