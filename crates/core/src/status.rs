//! Status and progress reporting
//!
//! One-way push from the engine to whatever front-end is listening. The
//! engine never assumes a GUI exists on the other end; every method has
//! a no-op default so a sink implements only what it cares about.

/// Collaborator-supplied sink for textual status and load progress.
pub trait StatusSink: Send + Sync {
    /// A human-readable status line ("Scanning directory...", mode
    /// summaries, and so on).
    fn status(&self, _message: &str) {}

    /// Load progress in `0.0..=1.0`.
    fn progress(&self, _fraction: f64) {}
}

/// Sink that discards everything. The default when no front-end is
/// attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatusSink;

impl StatusSink for NullStatusSink {}
