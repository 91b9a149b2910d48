//! The label store: one source of truth, many observers.

use std::collections::BTreeMap;
use tokio::sync::broadcast;
use tracing::debug;

use crate::{LabelDocument, LabelError, Result};

/// Capacity of the change channel; slow subscribers see `Lagged`.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// One applied assignment. `value: None` means the label was cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelChange {
    pub group: String,
    pub pos: usize,
    pub value: Option<String>,
}

/// Sparse per-scene label assignments keyed by `(group, pos)`.
#[derive(Debug)]
pub struct LabelStore {
    doc: LabelDocument,
    dirty: bool,
    changes: broadcast::Sender<LabelChange>,
}

impl LabelStore {
    /// Wrap a document, padding every group's array to `scene_count`.
    ///
    /// Groups present in the schema but missing from `values` start unset.
    pub fn new(mut doc: LabelDocument, scene_count: usize) -> Result<Self> {
        doc.validate()?;
        for group in doc.schema.keys() {
            let values = doc.values.entry(group.clone()).or_default();
            if values.len() < scene_count {
                values.resize(scene_count, None);
            }
        }
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            doc,
            dirty: false,
            changes,
        })
    }

    /// Record `value` for `(group, pos)`, replacing any previous value.
    pub fn set_label(&mut self, group: &str, pos: usize, value: &str) -> Result<LabelChange> {
        let permitted = self
            .doc
            .schema
            .get(group)
            .ok_or_else(|| LabelError::UnknownGroup(group.to_string()))?;
        if !permitted.iter().any(|v| v == value) {
            return Err(LabelError::InvalidValue {
                group: group.to_string(),
                value: value.to_string(),
            });
        }
        self.assign(group, pos, Some(value.to_string()))
    }

    /// Make `(group, pos)` unset.
    pub fn clear_label(&mut self, group: &str, pos: usize) -> Result<LabelChange> {
        if !self.doc.schema.contains_key(group) {
            return Err(LabelError::UnknownGroup(group.to_string()));
        }
        self.assign(group, pos, None)
    }

    fn assign(&mut self, group: &str, pos: usize, value: Option<String>) -> Result<LabelChange> {
        let values = self
            .doc
            .values
            .get_mut(group)
            .ok_or_else(|| LabelError::UnknownGroup(group.to_string()))?;
        let len = values.len();
        let slot = values.get_mut(pos).ok_or_else(|| LabelError::PosOutOfRange {
            group: group.to_string(),
            pos,
            len,
        })?;
        *slot = value.clone();
        self.dirty = true;

        let change = LabelChange {
            group: group.to_string(),
            pos,
            value,
        };
        debug!(group = %change.group, pos, value = ?change.value, "Label updated");
        // no receivers is fine
        let _ = self.changes.send(change.clone());
        Ok(change)
    }

    /// Current value for `(group, pos)`; `None` when unset or unknown.
    pub fn get(&self, group: &str, pos: usize) -> Option<&str> {
        self.doc
            .values
            .get(group)
            .and_then(|values| values.get(pos))
            .and_then(|v| v.as_deref())
    }

    /// Every group's value for one scene.
    pub fn labels_for(&self, pos: usize) -> BTreeMap<String, Option<String>> {
        self.doc
            .schema
            .keys()
            .map(|group| (group.clone(), self.get(group, pos).map(str::to_string)))
            .collect()
    }

    /// Observe every applied change.
    pub fn subscribe(&self) -> broadcast::Receiver<LabelChange> {
        self.changes.subscribe()
    }

    pub fn schema(&self) -> &BTreeMap<String, Vec<String>> {
        &self.doc.schema
    }

    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.doc.schema.keys().map(String::as_str)
    }

    /// Copy of the current document, for download or saving.
    pub fn snapshot(&self) -> LabelDocument {
        self.doc.clone()
    }

    /// Whether anything changed since load or the last [`mark_clean`](Self::mark_clean).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
