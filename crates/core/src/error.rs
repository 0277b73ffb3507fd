//! Browser error taxonomy

use std::path::PathBuf;

use lightbox_loader::LoaderError;

/// Errors surfaced by the browsing engine.
///
/// None of these are fatal to the engine itself: navigation errors leave
/// the cursor where it was, and a failed directory load leaves the
/// previous collection untouched.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("image {path} is not resident in memory")]
    NotResident { path: PathBuf },

    #[error("no images loaded")]
    Empty,
}
