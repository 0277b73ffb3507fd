//! Memory budget tracking for bounded payload residency
//!
//! This module provides the single source of truth for how many bytes of
//! raw image data are currently resident. Loader workers reserve space
//! before reading a file and release it when a payload is freed; the
//! counter never exceeds the ceiling and never underflows.

use std::sync::atomic::{AtomicU64, Ordering};

/// Memory budget tracker with a fixed ceiling.
///
/// The counter and ceiling are private; callers interact only through
/// `reserve`, `release`, and the read-only accessors, so the bounded
/// invariant is enforced at the type boundary.
///
/// `reserve` is a compare-and-swap loop that re-validates against the
/// live counter on every retry. Two workers racing for the last slice of
/// budget cannot jointly overshoot the ceiling: one CAS wins, the other
/// re-reads and fails the fit check.
///
/// # Example
///
/// ```
/// use lightbox_cache::MemoryBudget;
///
/// let budget = MemoryBudget::new(10 * 1024 * 1024);
///
/// if budget.reserve(4096) {
///     // ... read the file, keep the payload resident ...
///     budget.release(4096);
/// }
/// assert_eq!(budget.current(), 0);
/// ```
#[derive(Debug)]
pub struct MemoryBudget {
    /// Maximum total resident bytes for one process lifetime
    ceiling: u64,
    /// Current resident byte count
    current: AtomicU64,
}

impl MemoryBudget {
    /// Create a new budget with the given ceiling in bytes.
    pub fn new(ceiling: u64) -> Self {
        Self {
            ceiling,
            current: AtomicU64::new(0),
        }
    }

    /// Create a budget with a ceiling in megabytes.
    pub fn with_limit_mb(ceiling_mb: u64) -> Self {
        Self::new(ceiling_mb * 1024 * 1024)
    }

    /// Atomically reserve `amount` bytes.
    ///
    /// Succeeds only if the post-add value would not exceed the ceiling;
    /// otherwise the counter is left untouched and `false` is returned.
    /// Never blocks waiting for space to free up.
    pub fn reserve(&self, amount: u64) -> bool {
        self.current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                let candidate = current.checked_add(amount)?;
                (candidate <= self.ceiling).then_some(candidate)
            })
            .is_ok()
    }

    /// Atomically release `amount` bytes, clamped at zero.
    ///
    /// The clamp makes a release with a stale amount safe rather than an
    /// error: the counter saturates at zero instead of underflowing.
    pub fn release(&self, amount: u64) {
        self.current
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_sub(amount))
            })
            .ok();
    }

    /// Get the live resident byte count.
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Get the ceiling in bytes.
    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    /// Get the bytes still available under the ceiling.
    pub fn available(&self) -> u64 {
        self.ceiling.saturating_sub(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_budget_basic() {
        let budget = MemoryBudget::new(1000);
        assert_eq!(budget.ceiling(), 1000);
        assert_eq!(budget.current(), 0);
        assert_eq!(budget.available(), 1000);
    }

    #[test]
    fn test_with_limit_mb() {
        let budget = MemoryBudget::with_limit_mb(10);
        assert_eq!(budget.ceiling(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_reserve_within_ceiling() {
        let budget = MemoryBudget::new(1000);

        assert!(budget.reserve(600));
        assert_eq!(budget.current(), 600);
        assert_eq!(budget.available(), 400);

        assert!(budget.reserve(400));
        assert_eq!(budget.current(), 1000);
        assert_eq!(budget.available(), 0);
    }

    #[test]
    fn test_reserve_over_ceiling_leaves_counter_untouched() {
        let budget = MemoryBudget::new(1000);

        assert!(budget.reserve(900));
        assert!(!budget.reserve(200));
        assert_eq!(budget.current(), 900);
    }

    #[test]
    fn test_reserve_exact_fit_succeeds() {
        let budget = MemoryBudget::new(1000);
        assert!(budget.reserve(1000));
        assert!(!budget.reserve(1));
    }

    #[test]
    fn test_release_clamps_at_zero() {
        let budget = MemoryBudget::new(1000);

        budget.reserve(100);
        budget.release(500);
        assert_eq!(budget.current(), 0);

        // Releasing with nothing resident is a no-op, not an underflow.
        budget.release(42);
        assert_eq!(budget.current(), 0);
    }

    #[test]
    fn test_zero_ceiling_rejects_everything() {
        let budget = MemoryBudget::new(0);
        assert!(!budget.reserve(1));
        assert!(budget.reserve(0));
        assert_eq!(budget.current(), 0);
    }

    #[test]
    fn test_concurrent_reserve_never_overshoots() {
        let budget = Arc::new(MemoryBudget::new(1000));

        // 8 threads each fight for 100-byte slices; at most 10 can win.
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let budget = Arc::clone(&budget);
                thread::spawn(move || {
                    let mut won = 0u64;
                    for _ in 0..100 {
                        if budget.reserve(100) {
                            won += 1;
                        }
                    }
                    won
                })
            })
            .collect();

        let total_won: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total_won, 10);
        assert_eq!(budget.current(), 1000);
    }

    #[test]
    fn test_concurrent_reserve_release_balances() {
        let budget = Arc::new(MemoryBudget::new(u64::MAX));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let budget = Arc::clone(&budget);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        assert!(budget.reserve(128));
                        budget.release(128);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(budget.current(), 0);
    }
}
