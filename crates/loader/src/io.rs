//! File reading with header validation
//!
//! Loading a record means reading the whole file and checking that it is
//! a decodable image. The check is a format sniff that parses only the
//! header for dimensions, not a full decode; actual decoding is deferred
//! to the prefetch/decode cache layer.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::ImageReader;

use crate::{LoaderError, LoaderResult};

/// Read `path` fully into memory and validate the image header.
///
/// Returns the raw file bytes on success. Fails with `FileRead` if the
/// file cannot be read and `InvalidImage` if the bytes do not parse as
/// a supported image format.
pub fn read_validated(path: &Path) -> LoaderResult<Arc<Vec<u8>>> {
    let data = std::fs::read(path).map_err(|source| LoaderError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let reader = ImageReader::new(Cursor::new(&data))
        .with_guessed_format()
        .map_err(|source| LoaderError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

    reader
        .into_dimensions()
        .map_err(|source| LoaderError::InvalidImage {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(Arc::new(data))
}
