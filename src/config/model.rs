// src/config/model.rs

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::paths;

/// A class of files a container cares about: every file under `directory`
/// whose name matches `filter` (e.g. all `*.spec.js` under `src/`).
///
/// Only used to derive watches; individual tracked files are not tagged with
/// the group they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileGroup {
    pub directory: PathBuf,
    pub filter: String,
}

impl FileGroup {
    pub fn new(directory: impl Into<PathBuf>, filter: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            filter: filter.into(),
        }
    }
}

/// Immutable snapshot of one container's configuration.
///
/// Produced once by a [`ConfigLoader`] at container construction; a container
/// never re-reads its configuration in place. A configuration-file edit tears
/// the container down and builds a fresh one with a fresh snapshot.
#[derive(Clone)]
pub struct Configuration {
    source: PathBuf,
    config_file: Option<PathBuf>,
    file_groups: Vec<FileGroup>,
    files: Vec<PathBuf>,
    file_keys: HashSet<String>,
}

impl Configuration {
    pub fn new(
        source: impl Into<PathBuf>,
        config_file: Option<PathBuf>,
        file_groups: Vec<FileGroup>,
        files: Vec<PathBuf>,
    ) -> Self {
        let file_keys = files.iter().map(|p| paths::path_key(p)).collect();
        Self {
            source: source.into(),
            config_file,
            file_groups,
            files,
            file_keys,
        }
    }

    /// The settings or config file this snapshot was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Explicit config-file override declared by a settings file, if any.
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    pub fn file_groups(&self) -> &[FileGroup] {
        &self.file_groups
    }

    /// The expanded member file list at load time.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Case-insensitive membership test on normalized absolute paths.
    pub fn has_file(&self, path: &Path) -> bool {
        self.file_keys.contains(&paths::path_key(path))
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("source", &self.source)
            .field("file_groups", &self.file_groups.len())
            .field("files", &self.files.len())
            .finish_non_exhaustive()
    }
}

/// External collaborator that turns a settings/config file into a
/// [`Configuration`] snapshot.
pub trait ConfigLoader: Send + Sync {
    fn load(&self, source: &Path) -> Result<Configuration>;
}
