// src/paths.rs

//! Path normalization and comparison helpers.
//!
//! All container-level bookkeeping compares paths case-insensitively on
//! normalized absolute forms. The normalized *key* (lowercased, forward
//! slashes, `.`/`..` resolved lexically) is what goes into maps and what
//! equality is defined over; the original `PathBuf` spelling is kept for
//! logging and for talking back to the filesystem.

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: resolve `.` and `..`, make relative paths
/// absolute against the current working directory.
///
/// Deliberately does not hit the filesystem (no symlink resolution), so it
/// works identically for mock paths in tests and for paths of files that no
/// longer exist.
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut out = PathBuf::new();
    for comp in absolute.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonical map/equality key for a path: normalized, lowercased, forward
/// slashes, no trailing slash.
pub fn path_key(path: &Path) -> String {
    let s = normalize(path).to_string_lossy().replace('\\', "/");
    let s = s.to_lowercase();
    match s.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => s,
    }
}

/// Case-insensitive equality on normalized absolute forms.
pub fn paths_equal(a: &Path, b: &Path) -> bool {
    path_key(a) == path_key(b)
}

/// True if `dir` is a proper ancestor of `path` (component-boundary
/// semantics, case-insensitive). `dir == path` returns false.
pub fn is_proper_ancestor(dir: &Path, path: &Path) -> bool {
    let dir_key = path_key(dir);
    let path_key = path_key(path);
    if dir_key.ends_with('/') {
        // Filesystem root.
        return path_key.len() > dir_key.len() && path_key.starts_with(&dir_key);
    }
    path_key.len() > dir_key.len()
        && path_key.starts_with(&dir_key)
        && path_key.as_bytes()[dir_key.len()] == b'/'
}

/// True if `path` lies inside `dir` (strictly below it).
pub fn is_in_directory(path: &Path, dir: &Path) -> bool {
    is_proper_ancestor(dir, path)
}
