//! In-memory byte source with failure injection.

use async_trait::async_trait;
use bytes::Bytes;
use grid_codec::{CodecError, DataSource};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// A [`DataSource`] backed by a map of URL to bytes.
///
/// URLs can be marked as failing, and every fetch is counted so tests can
/// assert on cache behaviour.
#[derive(Default)]
pub struct MemorySource {
    files: Mutex<HashMap<String, Bytes>>,
    failing: Mutex<HashSet<String>>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_file(self, url: &str, bytes: impl Into<Bytes>) -> Self {
        self.insert(url, bytes);
        self
    }

    pub fn insert(&self, url: &str, bytes: impl Into<Bytes>) {
        self.files.lock().unwrap().insert(url.to_string(), bytes.into());
    }

    /// Make every fetch of `url` fail with a fetch error.
    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    /// Undo [`fail`](Self::fail).
    pub fn heal(&self, url: &str) {
        self.failing.lock().unwrap().remove(url);
    }

    /// Number of fetches attempted for `url`.
    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    /// Number of fetches attempted across all URLs.
    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch(&self, url: &str) -> grid_codec::Result<Bytes> {
        *self
            .fetches
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;

        if self.failing.lock().unwrap().contains(url) {
            return Err(CodecError::fetch(url, "injected failure"));
        }

        self.files
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| CodecError::fetch(url, "404 Not Found"))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
