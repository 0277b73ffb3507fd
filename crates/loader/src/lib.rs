//! Lightbox Loader Library
//!
//! Memory-bounded loading of image files: directory discovery, the
//! concurrent bulk loader used when every file fits under the memory
//! ceiling, and the sequential on-demand loader used when it does not.
//!
//! Both loaders reserve space through [`lightbox_cache::MemoryBudget`]
//! before reading a file and validate payloads with a cheap header sniff
//! (no full decode). The bulk loader degrades gracefully when the budget
//! runs out mid-batch; the on-demand loader treats the same condition as
//! a hard error because there is no sibling record to skip in favor of.

mod bulk;
mod discover;
mod error;
mod io;
mod ondemand;
mod record;

pub use bulk::{BulkLoadConfig, BulkLoadReport, BulkLoader};
pub use discover::{discover_images, is_image_file, SUPPORTED_EXTENSIONS};
pub use error::{LoaderError, LoaderResult};
pub use io::read_validated;
pub use ondemand::OnDemandLoader;
pub use record::ImageRecord;
