//! Per-phase staleness cache.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::scan::FileRecord;

/// Maps a file path to the time its output was last durably written.
///
/// Entries for different paths never conflict, so concurrent jobs update
/// the cache without coordination. A missing entry means "never processed".
#[derive(Debug, Default)]
pub struct StalenessCache {
    processed: DashMap<PathBuf, SystemTime>,
}

impl StalenessCache {
    pub fn new() -> Self {
        Self {
            processed: DashMap::new(),
        }
    }

    pub fn last_processed(&self, path: &Path) -> Option<SystemTime> {
        self.processed.get(path).map(|r| *r)
    }

    /// Record a successful write. Call only after the output is on disk.
    pub fn mark_processed(&self, path: &Path, at: SystemTime) {
        self.processed.insert(path.to_path_buf(), at);
    }

    /// Whether `record` must be processed this run.
    ///
    /// Fresh (skip) when it has not been modified since the last successful
    /// processing, or when `threshold` is set and the file is smaller than
    /// it. The threshold applies to never-seen files too.
    pub fn is_stale(&self, record: &FileRecord, threshold: Option<u64>) -> bool {
        if threshold.is_some_and(|min| record.size < min) {
            return false;
        }
        match self.last_processed(&record.path) {
            Some(at) => record.modified > at,
            None => true,
        }
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }

    pub fn clear(&self) {
        self.processed.clear();
    }
}
