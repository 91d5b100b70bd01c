// src/config/loader.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::Glob;
use serde::Deserialize;

use crate::config::model::{ConfigLoader, Configuration, FileGroup};
use crate::errors::{Result, TestWatchError};
use crate::fs::FileSystem;
use crate::paths;

/// Raw TOML shape of a settings file:
///
/// ```toml
/// config = "karma.conf.js"   # optional override, relative to the settings file
///
/// [[files]]
/// directory = "src"
/// filter = "*.spec.js"
/// ```
#[derive(Debug, Deserialize)]
struct RawSettings {
    #[serde(default)]
    config: Option<String>,
    #[serde(default)]
    files: Vec<RawFileGroup>,
}

#[derive(Debug, Deserialize)]
struct RawFileGroup {
    directory: String,
    filter: String,
}

/// Reference [`ConfigLoader`] for TOML settings files.
///
/// This only performs deserialization and member-file expansion; hosts with
/// different settings formats supply their own `ConfigLoader`.
#[derive(Debug, Clone)]
pub struct TomlConfigLoader {
    fs: Arc<dyn FileSystem>,
}

impl TomlConfigLoader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl ConfigLoader for TomlConfigLoader {
    fn load(&self, source: &Path) -> Result<Configuration> {
        let contents = self.fs.read_to_string(source).map_err(|e| {
            TestWatchError::ConfigError(format!("reading settings {:?}: {e}", source))
        })?;
        let raw: RawSettings = toml::from_str(&contents)?;

        let base = paths::normalize(source);
        let base_dir = base.parent().unwrap_or(Path::new("/")).to_path_buf();

        let config_file = raw.config.as_ref().map(|c| base_dir.join(c));

        let file_groups: Vec<FileGroup> = raw
            .files
            .iter()
            .map(|g| FileGroup::new(base_dir.join(&g.directory), g.filter.clone()))
            .collect();

        let mut files = Vec::new();
        for group in &file_groups {
            collect_group_files(&*self.fs, group, &mut files)?;
        }

        Ok(Configuration::new(base, config_file, file_groups, files))
    }
}

/// Collect all files under the group's directory (recursively) whose name
/// matches the group's filter.
fn collect_group_files(
    fs: &dyn FileSystem,
    group: &FileGroup,
    out: &mut Vec<PathBuf>,
) -> Result<()> {
    let matcher = Glob::new(&group.filter)
        .map_err(|e| {
            TestWatchError::ConfigError(format!("invalid filter {:?}: {e}", group.filter))
        })?
        .compile_matcher();

    if !fs.is_dir(&group.directory) {
        // A configured directory that does not exist yet simply has no members.
        return Ok(());
    }

    let mut stack = vec![group.directory.clone()];
    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path)
                && let Some(name) = path.file_name()
                && matcher.is_match(name)
            {
                out.push(path);
            }
        }
    }

    Ok(())
}
