//! The image browsing engine
//!
//! Owns the record collection, the navigation cursor, the loading-mode
//! flag, and the wiring between the loaders, the decode cache, and the
//! prefetch supervisor. Navigation transitions are linearized under a
//! single lock; the decode cache has its own lock so slow decode work
//! never blocks `next`/`previous`/`current_record`.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

use image::DynamicImage;
use lightbox_cache::{DecodeCache, DecodeCacheStats, MemoryBudget};
use lightbox_loader::{
    discover_images, BulkLoadConfig, BulkLoader, ImageRecord, LoaderError, OnDemandLoader,
};

use crate::prefetch::{self, PrefetchSupervisor};
use crate::status::{NullStatusSink, StatusSink};
use crate::BrowserError;

/// Loading strategy chosen once per directory load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingMode {
    /// Every qualifying file loaded concurrently up front (total size
    /// fits under the ceiling).
    Bulk,
    /// Only the current record resident at a time, swapped on
    /// navigation (total size exceeds the ceiling).
    Sequential,
}

/// Configuration for the browsing engine.
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Memory ceiling for resident payloads in bytes. Default: 3 GiB.
    pub max_memory_bytes: u64,

    /// Prefetch window half-width: how many images ahead and behind the
    /// cursor are kept decoded. Default: 2.
    pub prefetch_radius: usize,

    /// Worker pool settings for bulk loads.
    pub bulk: BulkLoadConfig,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            max_memory_bytes: 3 * 1024 * 1024 * 1024,
            prefetch_radius: 2,
            bulk: BulkLoadConfig::default(),
        }
    }
}

impl BrowserConfig {
    /// Create a configuration with a memory ceiling in megabytes.
    pub fn with_limit_mb(limit_mb: u64) -> Self {
        Self {
            max_memory_bytes: limit_mb * 1024 * 1024,
            ..Default::default()
        }
    }

    /// Set the memory ceiling in bytes.
    pub fn with_max_memory_bytes(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = bytes;
        self
    }

    /// Set the prefetch window half-width.
    pub fn with_prefetch_radius(mut self, radius: usize) -> Self {
        self.prefetch_radius = radius;
        self
    }

    /// Set the bulk loader pool configuration.
    pub fn with_bulk_config(mut self, bulk: BulkLoadConfig) -> Self {
        self.bulk = bulk;
        self
    }
}

/// Everything guarded by the navigation lock.
///
/// The record collection is never restructured during one load, so
/// indices are stable handles for the cursor and the decode cache.
pub(crate) struct BrowserState {
    pub(crate) records: Vec<ImageRecord>,
    /// `None` iff `records` is empty; otherwise `0 <= cursor < len`.
    pub(crate) cursor: Option<usize>,
    pub(crate) sequential: bool,
}

/// Memory-bounded image browser.
///
/// `load_directory` enumerates a directory, picks bulk or sequential
/// loading by comparing the total size against the ceiling, and resets
/// the cursor to the first image. `next`/`previous` clamp silently at
/// the ends, lazily load in sequential mode, and retrigger background
/// prefetch. A failed load leaves the previously loaded collection
/// untouched.
pub struct ImageBrowser {
    state: Arc<Mutex<BrowserState>>,
    budget: Arc<MemoryBudget>,
    cache: Arc<DecodeCache>,
    bulk: BulkLoader,
    ondemand: OnDemandLoader,
    supervisor: PrefetchSupervisor,
    status: Arc<dyn StatusSink>,
    prefetch_radius: usize,
}

impl ImageBrowser {
    /// Create a browser with the given configuration and no status sink.
    pub fn new(config: BrowserConfig) -> Self {
        Self::with_status_sink(config, Arc::new(NullStatusSink))
    }

    /// Create a browser that pushes status and progress to `sink`.
    pub fn with_status_sink(config: BrowserConfig, sink: Arc<dyn StatusSink>) -> Self {
        let budget = Arc::new(MemoryBudget::new(config.max_memory_bytes));
        Self {
            state: Arc::new(Mutex::new(BrowserState {
                records: Vec::new(),
                cursor: None,
                sequential: false,
            })),
            bulk: BulkLoader::with_config(Arc::clone(&budget), config.bulk),
            ondemand: OnDemandLoader::new(Arc::clone(&budget)),
            budget,
            cache: Arc::new(DecodeCache::new()),
            supervisor: PrefetchSupervisor::new(),
            status: sink,
            prefetch_radius: config.prefetch_radius,
        }
    }

    /// Load all qualifying images from `dir`, replacing any previous
    /// collection.
    ///
    /// Fails with `DirectoryRead` if the directory cannot be listed and
    /// `NoImagesFound` if it contains no qualifying files; both leave
    /// the prior collection untouched.
    pub fn load_directory(&self, dir: &Path) -> Result<(), BrowserError> {
        self.status.status("Scanning directory...");

        let mut records = discover_images(dir)?;
        if records.is_empty() {
            return Err(LoaderError::NoImagesFound(dir.to_path_buf()).into());
        }

        let total_size: u64 = records.iter().map(|r| r.file_size()).sum();
        let sequential = total_size > self.budget.ceiling();
        log::info!(
            "found {} images in {}, total {:.2} MB ({})",
            records.len(),
            dir.display(),
            mb(total_size),
            if sequential { "sequential" } else { "bulk" },
        );

        // Past the failure points: supersede outstanding prefetch work,
        // drop stale decodes, and drain the previous collection's
        // payloads back into the budget.
        self.supervisor.invalidate();
        self.cache.clear();
        {
            let mut state = self.state.lock().unwrap();
            for record in state.records.iter_mut() {
                self.ondemand.free(record);
            }
        }

        if sequential {
            self.status.status(&format!(
                "Sequential mode: {} images, {:.2} MB total",
                records.len(),
                mb(total_size)
            ));
        } else {
            self.status.status("Loading images concurrently...");
            self.bulk
                .load_all(&mut records, |fraction| self.status.progress(fraction));
        }

        {
            let mut state = self.state.lock().unwrap();
            state.records = records;
            state.cursor = Some(0);
            state.sequential = sequential;

            if sequential {
                // Reported, not fatal: the collection is usable even if
                // the first image cannot be made resident right now.
                if let Err(error) = self.ondemand.load_if_needed(&mut state.records, 0) {
                    log::warn!("failed to load first image: {error}");
                }
            }
        }

        self.status.progress(1.0);
        self.push_position_status();
        self.trigger_prefetch();
        Ok(())
    }

    /// Advance the cursor by one.
    ///
    /// Silent no-op at the last index (no wraparound). In sequential
    /// mode the new cursor's record is loaded on demand; a load failure
    /// is returned but the cursor is not rolled back.
    pub fn next(&self) -> Result<(), BrowserError> {
        let mut load_result = Ok(());
        let moved = {
            let mut state = self.state.lock().unwrap();
            let cursor = state.cursor.ok_or(BrowserError::Empty)?;
            if cursor + 1 < state.records.len() {
                state.cursor = Some(cursor + 1);
                if state.sequential {
                    load_result = self
                        .ondemand
                        .load_if_needed(&mut state.records, cursor + 1)
                        .map_err(BrowserError::from);
                }
                true
            } else {
                false
            }
        };

        if moved {
            self.push_position_status();
            self.trigger_prefetch();
        }
        load_result
    }

    /// Move the cursor back by one. Symmetric to [`Self::next`],
    /// clamped at index 0.
    pub fn previous(&self) -> Result<(), BrowserError> {
        let mut load_result = Ok(());
        let moved = {
            let mut state = self.state.lock().unwrap();
            let cursor = state.cursor.ok_or(BrowserError::Empty)?;
            if cursor > 0 {
                state.cursor = Some(cursor - 1);
                if state.sequential {
                    load_result = self
                        .ondemand
                        .load_if_needed(&mut state.records, cursor - 1)
                        .map_err(BrowserError::from);
                }
                true
            } else {
                false
            }
        };

        if moved {
            self.push_position_status();
            self.trigger_prefetch();
        }
        load_result
    }

    /// The record under the cursor.
    pub fn current_record(&self) -> Result<ImageRecord, BrowserError> {
        let state = self.state.lock().unwrap();
        let cursor = state.cursor.ok_or(BrowserError::Empty)?;
        Ok(state.records[cursor].clone())
    }

    /// The decoded image for the current record, cache-aside.
    ///
    /// Returns the cached decode immediately when present; otherwise
    /// decodes synchronously on the calling thread and inserts the
    /// result before returning.
    pub fn current_decoded(&self) -> Result<Arc<DynamicImage>, BrowserError> {
        let (index, record) = {
            let state = self.state.lock().unwrap();
            let cursor = state.cursor.ok_or(BrowserError::Empty)?;
            (cursor, state.records[cursor].clone())
        };

        if let Some(cached) = self.cache.get(index) {
            return Ok(cached);
        }

        let payload = record.payload().ok_or_else(|| BrowserError::NotResident {
            path: record.path().to_path_buf(),
        })?;
        let decoded = image::load_from_memory(&payload).map_err(|source| BrowserError::Decode {
            path: record.path().to_path_buf(),
            source,
        })?;

        let decoded = Arc::new(decoded);
        self.cache.insert(index, Arc::clone(&decoded));
        Ok(decoded)
    }

    /// Whether a collection is loaded.
    pub fn has_any(&self) -> bool {
        !self.state.lock().unwrap().records.is_empty()
    }

    /// Number of records in the current collection.
    pub fn count(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }

    /// Cursor position, `None` when no collection is loaded.
    pub fn current_index(&self) -> Option<usize> {
        self.state.lock().unwrap().cursor
    }

    /// Loading strategy of the current collection.
    pub fn loading_mode(&self) -> Option<LoadingMode> {
        let state = self.state.lock().unwrap();
        state.cursor?;
        Some(if state.sequential {
            LoadingMode::Sequential
        } else {
            LoadingMode::Bulk
        })
    }

    /// Live resident byte count.
    pub fn current_memory_usage(&self) -> u64 {
        self.budget.current()
    }

    /// The memory ceiling in bytes.
    pub fn memory_ceiling(&self) -> u64 {
        self.budget.ceiling()
    }

    /// Number of records currently holding their payload.
    pub fn resident_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|r| r.is_resident())
            .count()
    }

    /// Decode cache usage counters.
    pub fn cache_stats(&self) -> DecodeCacheStats {
        self.cache.stats()
    }

    /// Spawn one background prefetch pass for the current position,
    /// superseding any outstanding pass.
    fn trigger_prefetch(&self) {
        let ticket = self.supervisor.begin();
        let state = Arc::clone(&self.state);
        let cache = Arc::clone(&self.cache);
        let ondemand = self.ondemand.clone();
        let radius = self.prefetch_radius;

        thread::spawn(move || {
            prefetch::run_pass(&ticket, &state, &cache, &ondemand, radius);
        });
    }

    /// Push a one-line position/memory summary to the status sink.
    fn push_position_status(&self) {
        let state = self.state.lock().unwrap();
        let Some(cursor) = state.cursor else {
            self.status.status("No images loaded");
            return;
        };

        let record = &state.records[cursor];
        let name = record
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| record.path().display().to_string());
        let mut line = format!(
            "{} ({}) - Image {}/{} - Memory: {:.2} MB/{:.2} MB",
            name,
            if record.is_resident() {
                "loaded"
            } else {
                "not loaded"
            },
            cursor + 1,
            state.records.len(),
            mb(self.budget.current()),
            mb(self.budget.ceiling()),
        );
        if state.sequential {
            line.push_str(" [Sequential Mode]");
        }
        self.status.status(&line);
    }
}

fn mb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}
