//! Lightbox Core Library
//!
//! The memory-bounded image browsing engine: navigation state machine,
//! background prefetch with windowed decode caching, and the public
//! surface a front-end drives.
//!
//! # Example
//!
//! ```no_run
//! use lightbox_core::{BrowserConfig, ImageBrowser};
//!
//! let browser = ImageBrowser::new(BrowserConfig::with_limit_mb(512));
//! browser.load_directory("/photos/holiday".as_ref())?;
//!
//! for _ in 0..browser.count() {
//!     let record = browser.current_record()?;
//!     println!("{}", record.path().display());
//!     browser.next()?;
//! }
//! # Ok::<(), lightbox_core::BrowserError>(())
//! ```

mod browser;
mod error;
mod prefetch;
mod status;

pub use browser::{BrowserConfig, ImageBrowser, LoadingMode};
pub use error::BrowserError;
pub use status::{NullStatusSink, StatusSink};

pub use lightbox_cache::{DecodeCache, DecodeCacheStats, MemoryBudget};
pub use lightbox_loader::{discover_images, ImageRecord, SUPPORTED_EXTENSIONS};
