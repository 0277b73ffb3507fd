//! Directory discovery for supported image files
//!
//! Non-recursive listing: subdirectories are skipped, not descended
//! into. Qualifying paths are returned sorted ascending by full path in
//! byte order, so collection indices are deterministic for one load.

use std::fs;
use std::path::Path;

use crate::{ImageRecord, LoaderError, LoaderResult};

/// File extensions accepted as images, compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: [&str; 8] =
    ["jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp"];

/// Check whether a path has a supported image extension.
pub fn is_image_file(path: &Path) -> bool {
    let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    SUPPORTED_EXTENSIONS
        .iter()
        .any(|supported| extension.eq_ignore_ascii_case(supported))
}

/// Scan `dir` and return records for every qualifying image file.
///
/// Entries whose metadata cannot be read are skipped with a warning so
/// a single unreadable file does not abort the whole scan. The returned
/// collection may be empty; the caller decides whether that is an error.
pub fn discover_images(dir: &Path) -> LoaderResult<Vec<ImageRecord>> {
    let entries = fs::read_dir(dir).map_err(|source| LoaderError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                log::warn!("skipping unreadable entry in {}: {error}", dir.display());
                continue;
            }
        };

        let path = entry.path();
        if path.is_dir() || !is_image_file(&path) {
            continue;
        }
        paths.push(path);
    }

    paths.sort();

    let mut records = Vec::with_capacity(paths.len());
    for path in paths {
        match fs::metadata(&path) {
            Ok(metadata) => records.push(ImageRecord::new(path, metadata.len())),
            Err(error) => {
                log::warn!("could not stat {}: {error}", path.display());
            }
        }
    }

    log::debug!(
        "discovered {} image files in {}",
        records.len(),
        dir.display()
    );
    Ok(records)
}
