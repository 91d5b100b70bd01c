// src/watch/hash.rs

//! Content fingerprinting for tracked files.
//!
//! A [`FileFingerprint`] is a blake3 digest of a file's bytes plus the
//! `(len, modified)` metadata observed at hashing time. Equality is defined
//! over the digest only; the metadata exists so a later call can skip
//! re-reading an apparently unchanged file.

use std::io::Read;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Content digest of one file at a point in time.
#[derive(Debug, Clone)]
pub struct FileFingerprint {
    digest: String,
    len: u64,
    modified: Option<SystemTime>,
}

impl FileFingerprint {
    /// Hex-encoded blake3 digest.
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl PartialEq for FileFingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}

impl Eq for FileFingerprint {}

/// Fingerprint a file, returning `Ok(None)` when it does not exist.
///
/// Missing is a normal, representable outcome, never an error; only a file
/// that exists but cannot be read yields `Err` (the caller treats that as
/// "no change this round").
///
/// When `previous` is supplied and the current size and mtime match the ones
/// recorded in it, the previous fingerprint is returned without re-reading
/// content. Mtimes of `None` never match, so sources without reliable mtimes
/// are always re-hashed.
pub fn fingerprint_file(
    fs: &dyn FileSystem,
    path: &Path,
    previous: Option<&FileFingerprint>,
) -> Result<Option<FileFingerprint>> {
    if !fs.is_file(path) {
        return Ok(None);
    }

    let meta = fs.metadata(path)?;

    if let Some(prev) = previous
        && prev.len == meta.len
        && prev.modified.is_some()
        && prev.modified == meta.modified
    {
        debug!("metadata unchanged, reusing fingerprint for {:?}", path);
        return Ok(Some(prev.clone()));
    }

    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let digest = hasher.finalize().to_hex().to_string();
    debug!(digest = %digest, "hashed {:?}", path);

    Ok(Some(FileFingerprint {
        digest,
        len: meta.len,
        modified: meta.modified,
    }))
}
