// src/container/index.rs

//! Per-container mapping of tracked file path -> last-known fingerprint.
//!
//! The index has no lock of its own; the owning [`Container`](super::Container)
//! serializes all access with one exclusive lock, so every
//! read-compare-write here is atomic with respect to concurrent
//! notifications for the same container.

use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

use crate::fs::FileSystem;
use crate::paths;
use crate::watch::hash::{FileFingerprint, fingerprint_file};

#[derive(Debug, Default)]
pub struct FileIndex {
    entries: HashMap<String, FileFingerprint>,
}

impl FileIndex {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Does this path belong to the index?
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(&paths::path_key(path))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-fingerprint `path` and record the result.
    ///
    /// Returns true when the index changed: the file exists with a digest
    /// different from the stored one (or was not tracked before), or the file
    /// is gone and its entry was dropped. The filesystem is the source of
    /// truth; the caller's notification reason is not consulted here.
    ///
    /// A transient read failure reports "no change" and leaves the entry
    /// untouched; the next notification retries naturally.
    pub fn set_current_hash(&mut self, fs: &dyn FileSystem, path: &Path) -> bool {
        let key = paths::path_key(path);
        let previous = self.entries.get(&key);

        match fingerprint_file(fs, path, previous) {
            Ok(Some(current)) => {
                let changed = previous != Some(&current);
                if changed {
                    self.entries.insert(key, current);
                }
                changed
            }
            Ok(None) => self.entries.remove(&key).is_some(),
            Err(err) => {
                warn!("failed to hash {:?}: {err} (treated as unchanged)", path);
                false
            }
        }
    }

    /// Unconditionally drop the entry; returns whether it existed.
    pub fn remove(&mut self, path: &Path) -> bool {
        self.entries.remove(&paths::path_key(path)).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
