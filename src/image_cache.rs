//! Thumbnail cache for fast page revisits.
//!
//! Caches decoded thumbnails keyed by dataset row index using an LRU policy.
//! Placeholders are never cached so that a file appearing later is picked up.
//! Row indices are only meaningful within one dataset, so each load gets a
//! fresh cache.

use log::debug;
use lru::LruCache;
use std::num::NonZeroUsize;

use crate::image_loader::Bitmap;

/// LRU cache for storing resolved thumbnails.
pub struct ImageCache {
    cache: LruCache<usize, Bitmap>,
}

impl ImageCache {
    /// Creates a new cache with the specified capacity (at least one entry).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
        }
    }

    /// Retrieves a thumbnail if present, marking it as recently used.
    pub fn get(&mut self, row_index: usize) -> Option<Bitmap> {
        let result = self.cache.get(&row_index).cloned();
        if result.is_some() {
            debug!("Cache HIT: row {}", row_index);
        } else {
            debug!("Cache MISS: row {}", row_index);
        }
        result
    }

    /// Stores a thumbnail. Placeholders are ignored.
    pub fn put(&mut self, row_index: usize, bitmap: Bitmap) {
        if bitmap.is_placeholder() {
            return;
        }
        debug!(
            "Cache PUT: row {} ({}x{})",
            row_index,
            bitmap.width(),
            bitmap.height()
        );
        self.cache.put(row_index, bitmap);
    }

    pub fn contains(&self, row_index: usize) -> bool {
        self.cache.contains(&row_index)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
