//! Sequential on-demand loader
//!
//! Used when the total size of a directory exceeds the memory ceiling.
//! This loader enforces the sequential-mode invariant: at most one
//! record is resident at a time. Every other record is freed *before*
//! reserving the target's size, so the target's own previous footprint
//! and all sibling footprints are back in the budget first — there is
//! always room unless a single file exceeds the ceiling outright, which
//! legitimately fails.

use std::sync::Arc;

use lightbox_cache::MemoryBudget;

use crate::io::read_validated;
use crate::{ImageRecord, LoaderError, LoaderResult};

/// Loader that swaps a single resident record in and out on navigation.
///
/// Unlike the bulk loader, a reservation failure here is a hard error:
/// there is no other record to skip in favor of.
#[derive(Clone)]
pub struct OnDemandLoader {
    budget: Arc<MemoryBudget>,
}

impl OnDemandLoader {
    /// Create an on-demand loader drawing on the given budget.
    pub fn new(budget: Arc<MemoryBudget>) -> Self {
        Self { budget }
    }

    /// Make the record at `target` resident, evicting every sibling.
    ///
    /// No-op if the target is already resident. On reservation failure
    /// the target stays non-resident and `BudgetExceeded` is returned.
    pub fn load_if_needed(
        &self,
        records: &mut [ImageRecord],
        target: usize,
    ) -> LoaderResult<()> {
        debug_assert!(target < records.len(), "target index out of range");

        if records[target].is_resident() {
            return Ok(());
        }

        // Free siblings first so their footprint is back in the budget
        // before the reserve below.
        self.free_others(records, target);

        let file_size = records[target].file_size();
        if !self.budget.reserve(file_size) {
            return Err(LoaderError::BudgetExceeded {
                current: self.budget.current(),
                requested: file_size,
                ceiling: self.budget.ceiling(),
            });
        }

        match read_validated(records[target].path()) {
            Ok(payload) => {
                records[target].make_resident(payload);
                log::debug!(
                    "loaded {} on demand ({} bytes resident)",
                    records[target].path().display(),
                    self.budget.current()
                );
                Ok(())
            }
            Err(error) => {
                self.budget.release(file_size);
                Err(error)
            }
        }
    }

    /// Free one record's payload, returning its size to the budget.
    pub fn free(&self, record: &mut ImageRecord) {
        if record.evict() {
            self.budget.release(record.file_size());
        }
    }

    /// Free every record except the one at `keep`.
    pub fn free_others(&self, records: &mut [ImageRecord], keep: usize) {
        for (index, record) in records.iter_mut().enumerate() {
            if index != keep && record.evict() {
                self.budget.release(record.file_size());
            }
        }
    }
}
