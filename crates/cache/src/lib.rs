//! Lightbox Cache Library
//!
//! Memory budget tracking and the windowed decode cache.
//!
//! The budget bounds how many raw image payloads may be resident at once;
//! the decode cache keeps render-ready images for a sliding window of
//! indices around the navigation cursor.

pub mod budget;
pub mod decode;

pub use budget::MemoryBudget;
pub use decode::{DecodeCache, DecodeCacheStats};
