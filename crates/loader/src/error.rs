//! Loader error taxonomy

use std::path::PathBuf;

/// Result alias for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;

/// Errors produced while discovering and loading image files.
///
/// `DirectoryRead` and `NoImagesFound` are fatal to a directory load.
/// `FileRead` and `InvalidImage` are recovered locally during a bulk
/// batch (the record stays non-resident) but surfaced by the on-demand
/// loader. `BudgetExceeded` follows the same split: skip-and-continue in
/// bulk mode, hard error on demand.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no image files found in directory: {0}")]
    NoImagesFound(PathBuf),

    #[error("failed to read image file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid image format in {path}: {source}")]
    InvalidImage {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("memory budget exceeded: current {current} + image {requested} > ceiling {ceiling}")]
    BudgetExceeded {
        current: u64,
        requested: u64,
        ceiling: u64,
    },
}
