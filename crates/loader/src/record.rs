//! Image record model

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One discovered image file and its optional in-memory payload.
///
/// Residency is the presence of the payload: a record is resident iff
/// `payload` is `Some`, so the flag and the data can never disagree.
/// The payload is shared via `Arc` so prefetch passes can clone it out
/// from under the navigation lock and decode without holding any lock.
///
/// `file_size` is captured at enumeration time and immutable afterwards;
/// it is the amount reserved against the memory budget, even if the file
/// changes on disk later.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    /// Full path to the image file
    path: PathBuf,
    /// Size of the file in bytes at enumeration time
    file_size: u64,
    /// Raw file bytes, present only while resident
    payload: Option<Arc<Vec<u8>>>,
}

impl ImageRecord {
    /// Create a non-resident record for a discovered file.
    pub fn new(path: PathBuf, file_size: u64) -> Self {
        Self {
            path,
            file_size,
            payload: None,
        }
    }

    /// Full path to the image file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File size in bytes, fixed at enumeration time.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Whether the raw payload is currently in memory.
    pub fn is_resident(&self) -> bool {
        self.payload.is_some()
    }

    /// The raw payload, if resident.
    pub fn payload(&self) -> Option<Arc<Vec<u8>>> {
        self.payload.clone()
    }

    /// Attach a payload, marking the record resident.
    pub fn make_resident(&mut self, payload: Arc<Vec<u8>>) {
        self.payload = Some(payload);
    }

    /// Drop the payload. Returns true if the record was resident.
    ///
    /// The caller is responsible for releasing `file_size` back to the
    /// budget when this returns true.
    pub fn evict(&mut self) -> bool {
        self.payload.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_not_resident() {
        let record = ImageRecord::new(PathBuf::from("/tmp/a.png"), 123);
        assert_eq!(record.path(), Path::new("/tmp/a.png"));
        assert_eq!(record.file_size(), 123);
        assert!(!record.is_resident());
        assert!(record.payload().is_none());
    }

    #[test]
    fn test_resident_roundtrip() {
        let mut record = ImageRecord::new(PathBuf::from("/tmp/a.png"), 3);
        record.make_resident(Arc::new(vec![1, 2, 3]));

        assert!(record.is_resident());
        assert_eq!(record.payload().unwrap().as_slice(), &[1, 2, 3]);

        assert!(record.evict());
        assert!(!record.is_resident());
        assert!(!record.evict());
    }
}
