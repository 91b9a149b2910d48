//! In-memory LRU cache for decoded grids.
//!
//! Keyed by grid URL so revisiting a scene, or showing it again after a
//! filter change, does not refetch and re-inflate its raw layers.

use grid_codec::DecodedGrid;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Statistics for the grid cache
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GridCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl GridCacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Shared LRU of decoded grids. Cloning shares the same cache.
#[derive(Clone)]
pub struct GridCache {
    cache: Arc<RwLock<LruCache<String, Arc<DecodedGrid>>>>,
    stats: Arc<RwLock<GridCacheStats>>,
    capacity: usize,
}

impl GridCache {
    /// Create a cache holding up to `capacity` grids (at least one).
    pub fn new(capacity: usize) -> Self {
        let size = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Arc::new(RwLock::new(LruCache::new(size))),
            stats: Arc::new(RwLock::new(GridCacheStats::default())),
            capacity: size.get(),
        }
    }

    /// Look up a grid, updating its recency.
    pub async fn get(&self, url: &str) -> Option<Arc<DecodedGrid>> {
        let mut cache = self.cache.write().await;
        let found = cache.get(url).cloned();
        let mut stats = self.stats.write().await;
        if found.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        found
    }

    pub async fn insert(&self, url: String, grid: Arc<DecodedGrid>) {
        let mut cache = self.cache.write().await;
        cache.put(url, grid);
        self.stats.write().await.entries = cache.len();
    }

    pub async fn stats(&self) -> GridCacheStats {
        let cache = self.cache.read().await;
        let mut stats = self.stats.write().await;
        stats.entries = cache.len();
        stats.clone()
    }

    pub async fn clear(&self) {
        self.cache.write().await.clear();
        *self.stats.write().await = GridCacheStats::default();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}
