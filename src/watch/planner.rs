// src/watch/planner.rs

//! Watch planning: turn a container's file groups into the minimal set of
//! non-overlapping filesystem watches.
//!
//! Within one filter, a directory whose proper ancestor is also watched with
//! that filter would produce duplicate notifications, so it is collapsed into
//! the ancestor's recursive watch. Directories with no ancestry relation stay
//! as separate watches. The two singleton files (settings and config) always
//! get their own non-recursive single-file watch.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::FileGroup;
use crate::paths;

/// One planned watch: a directory, a filename filter, and whether
/// subdirectories are included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSpec {
    pub directory: PathBuf,
    pub filter: String,
    pub recursive: bool,
}

/// Compute the watch set for a container.
///
/// `settings_file` and `config_file` are the container's two singleton files;
/// either may be absent. File groups with the same filter (case-insensitive)
/// are collapsed so that no planned watch is rooted under another planned
/// watch with the same filter.
pub fn plan_watches(
    groups: &[FileGroup],
    settings_file: Option<&Path>,
    config_file: Option<&Path>,
) -> Vec<WatchSpec> {
    let mut watches = Vec::new();

    for file in [settings_file, config_file].into_iter().flatten() {
        if let Some(spec) = single_file_watch(file)
            && !watches.contains(&spec)
        {
            watches.push(spec);
        }
    }

    // Group directories by filter, case-insensitively. BTreeMap keeps the
    // output order deterministic.
    let mut by_filter: BTreeMap<String, (String, Vec<PathBuf>)> = BTreeMap::new();
    for group in groups {
        let key = group.filter.to_lowercase();
        let entry = by_filter
            .entry(key)
            .or_insert_with(|| (group.filter.clone(), Vec::new()));
        let dir = paths::normalize(&group.directory);
        if !entry.1.iter().any(|d| paths::paths_equal(d, &dir)) {
            entry.1.push(dir);
        }
    }

    for (_, (filter, dirs)) in by_filter {
        for dir in &dirs {
            let covered = dirs
                .iter()
                .any(|other| paths::is_proper_ancestor(other, dir));
            if !covered {
                watches.push(WatchSpec {
                    directory: dir.clone(),
                    filter: filter.clone(),
                    recursive: true,
                });
            }
        }
    }

    watches
}

fn single_file_watch(file: &Path) -> Option<WatchSpec> {
    let file = paths::normalize(file);
    let name = file.file_name()?.to_str()?;
    if name.is_empty() {
        return None;
    }
    let directory = file.parent()?.to_path_buf();
    Some(WatchSpec {
        directory,
        filter: name.to_string(),
        recursive: false,
    })
}
