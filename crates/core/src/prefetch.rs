//! Background prefetch with generation-stamped cancellation
//!
//! Every navigation event triggers one fire-and-forget prefetch pass
//! that decodes the window of records around the cursor into the decode
//! cache and trims everything outside it. Passes are not linearized
//! against each other; instead the supervisor keeps a monotonically
//! increasing generation counter. A pass captures its generation at
//! start and checks it between every index, aborting silently once a
//! newer pass exists. Two passes briefly overlapping is tolerated: the
//! last writer for a key wins and each pass trims from its own snapshot.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use lightbox_cache::DecodeCache;
use lightbox_loader::OnDemandLoader;

use crate::browser::BrowserState;

/// Issues generation-stamped tickets to prefetch passes.
pub(crate) struct PrefetchSupervisor {
    generation: Arc<AtomicU64>,
}

impl PrefetchSupervisor {
    pub(crate) fn new() -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start a new generation, superseding every outstanding pass, and
    /// return the ticket for the pass about to run.
    pub(crate) fn begin(&self) -> PrefetchTicket {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        PrefetchTicket {
            generation,
            shared: Arc::clone(&self.generation),
        }
    }

    /// Supersede outstanding passes without starting a new one. Used at
    /// the top of a directory load before the cache is cleared.
    pub(crate) fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

/// A single pass's claim on the current generation.
pub(crate) struct PrefetchTicket {
    generation: u64,
    shared: Arc<AtomicU64>,
}

impl PrefetchTicket {
    /// True once a newer generation exists; the holder should abort.
    pub(crate) fn is_stale(&self) -> bool {
        self.shared.load(Ordering::Acquire) != self.generation
    }
}

/// The inclusive index window `[cursor - radius, cursor + radius]`
/// clipped to `[0, len - 1]`. `len` must be non-zero.
pub(crate) fn window_around(cursor: usize, len: usize, radius: usize) -> RangeInclusive<usize> {
    let start = cursor.saturating_sub(radius);
    let end = (cursor + radius).min(len - 1);
    start..=end
}

/// Run one prefetch pass to completion or early abort.
///
/// Snapshots cursor, collection length, and loading mode once, sweeps
/// the window in increasing order, then evicts cache entries outside the
/// snapshot window. The navigation lock is held only to load/clone a
/// payload; decoding always happens outside both locks so a slow decode
/// never blocks navigation.
pub(crate) fn run_pass(
    ticket: &PrefetchTicket,
    state: &Mutex<BrowserState>,
    cache: &DecodeCache,
    ondemand: &OnDemandLoader,
    radius: usize,
) {
    let (cursor, len, sequential) = {
        let guard = state.lock().unwrap();
        let Some(cursor) = guard.cursor else {
            return;
        };
        (cursor, guard.records.len(), guard.sequential)
    };
    if len == 0 {
        return;
    }

    let window = window_around(cursor, len, radius);
    for index in window.clone() {
        if ticket.is_stale() {
            return;
        }
        if cache.contains(index) {
            continue;
        }
        // In sequential mode only the cursor's record can be resident,
        // so decoding any sibling would force a load; skip them.
        if sequential && index != cursor {
            continue;
        }

        let payload = {
            let mut guard = state.lock().unwrap();
            // A newer directory load may have shrunk the collection.
            if index >= guard.records.len() {
                continue;
            }
            if sequential && !guard.records[index].is_resident() {
                if let Err(error) = ondemand.load_if_needed(&mut guard.records, index) {
                    log::warn!("prefetch could not load index {index}: {error}");
                    continue;
                }
            }
            guard.records[index].payload()
        };

        // Bulk mode: a non-resident record was already decided against
        // by the batch loader; no further loading is attempted here.
        let Some(payload) = payload else {
            continue;
        };

        match image::load_from_memory(&payload) {
            Ok(decoded) => cache.insert(index, Arc::new(decoded)),
            Err(error) => {
                log::warn!("prefetch decode failed for index {index}: {error}");
            }
        }
    }

    cache.retain_window(window);
}
