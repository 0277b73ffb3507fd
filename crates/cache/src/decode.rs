//! Windowed decode cache for render-ready images
//!
//! Keeps already-decoded images keyed by collection index so navigation
//! within the prefetch window never waits on a decode. Unlike an LRU
//! cache, the bound here is positional: after every prefetch sweep the
//! pass evicts every entry outside the window it computed, so live keys
//! are always a subset of `[cursor - w, cursor + w]`.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};

use image::DynamicImage;

/// Statistics about decode cache usage
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeCacheStats {
    /// Number of decoded images currently cached
    pub entry_count: usize,
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of entries evicted by window trimming
    pub evictions: u64,
}

impl DecodeCacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Internal cache state
#[derive(Default)]
struct CacheState {
    entries: HashMap<usize, Arc<DynamicImage>>,
    stats: DecodeCacheStats,
}

/// Index-keyed cache of decoded images, bounded to the prefetch window.
///
/// Thread-safe behind its own lock, deliberately distinct from the
/// navigation-state lock: a slow decode inserting here never blocks a
/// `next`/`previous` call. Concurrent prefetch passes may briefly
/// overlap; the last writer for a given key wins and each pass trims
/// from its own window snapshot, so overlap cannot corrupt the map.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lightbox_cache::DecodeCache;
/// use image::DynamicImage;
///
/// let cache = DecodeCache::new();
/// cache.insert(5, Arc::new(DynamicImage::new_rgba8(2, 2)));
///
/// assert!(cache.get(5).is_some());
/// cache.retain_window(3..=7);
/// assert!(cache.get(5).is_some());
/// cache.retain_window(8..=10);
/// assert!(cache.get(5).is_none());
/// ```
pub struct DecodeCache {
    state: Mutex<CacheState>,
}

impl DecodeCache {
    /// Create an empty decode cache.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Look up the decoded image for `index`, counting a hit or miss.
    pub fn get(&self, index: usize) -> Option<Arc<DynamicImage>> {
        let mut state = self.state.lock().unwrap();
        match state.entries.get(&index).cloned() {
            Some(image) => {
                state.stats.hits += 1;
                Some(image)
            }
            None => {
                state.stats.misses += 1;
                None
            }
        }
    }

    /// Check whether `index` is cached without touching hit/miss counts.
    pub fn contains(&self, index: usize) -> bool {
        self.state.lock().unwrap().entries.contains_key(&index)
    }

    /// Insert a decoded image for `index`, replacing any previous entry.
    pub fn insert(&self, index: usize, image: Arc<DynamicImage>) {
        let mut state = self.state.lock().unwrap();
        state.entries.insert(index, image);
        state.stats.entry_count = state.entries.len();
    }

    /// Evict every entry whose key falls outside `window`.
    ///
    /// Returns the number of entries evicted.
    pub fn retain_window(&self, window: RangeInclusive<usize>) -> usize {
        let mut state = self.state.lock().unwrap();
        let before = state.entries.len();
        state.entries.retain(|index, _| window.contains(index));
        let evicted = before - state.entries.len();
        state.stats.evictions += evicted as u64;
        state.stats.entry_count = state.entries.len();
        if evicted > 0 {
            log::debug!("decode cache evicted {evicted} entries outside {window:?}");
        }
        evicted
    }

    /// Drop every entry. Called at the start of a new directory load.
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.entries.clear();
        state.stats.entry_count = 0;
    }

    /// Number of cached images.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    /// Check whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the usage counters.
    pub fn stats(&self) -> DecodeCacheStats {
        self.state.lock().unwrap().stats
    }
}

impl Default for DecodeCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_image() -> Arc<DynamicImage> {
        Arc::new(DynamicImage::new_rgba8(2, 2))
    }

    #[test]
    fn test_insert_and_get() {
        let cache = DecodeCache::new();
        assert!(cache.is_empty());

        cache.insert(3, test_image());
        assert!(cache.contains(3));
        assert!(cache.get(3).is_some());
        assert!(cache.get(4).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_replaces_existing_entry() {
        let cache = DecodeCache::new();

        cache.insert(0, Arc::new(DynamicImage::new_rgba8(2, 2)));
        cache.insert(0, Arc::new(DynamicImage::new_rgba8(4, 4)));

        assert_eq!(cache.len(), 1);
        let cached = cache.get(0).unwrap();
        assert_eq!(cached.width(), 4);
    }

    #[test]
    fn test_retain_window_evicts_outside_keys() {
        let cache = DecodeCache::new();
        for index in 0..10 {
            cache.insert(index, test_image());
        }

        let evicted = cache.retain_window(3..=7);
        assert_eq!(evicted, 5);
        assert_eq!(cache.len(), 5);

        for index in 3..=7 {
            assert!(cache.contains(index), "index {index} should survive");
        }
        assert!(!cache.contains(2));
        assert!(!cache.contains(8));
    }

    #[test]
    fn test_retain_window_noop_when_all_inside() {
        let cache = DecodeCache::new();
        cache.insert(4, test_image());
        cache.insert(5, test_image());

        assert_eq!(cache.retain_window(3..=7), 0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_clear() {
        let cache = DecodeCache::new();
        cache.insert(0, test_image());
        cache.insert(1, test_image());

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(0).is_none());
    }

    #[test]
    fn test_stats_track_hits_misses_evictions() {
        let cache = DecodeCache::new();
        cache.insert(1, test_image());

        let _ = cache.get(1);
        let _ = cache.get(1);
        let _ = cache.get(9);
        cache.retain_window(5..=6);

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.entry_count, 0);
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }
}
