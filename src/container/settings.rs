// src/container/settings.rs

use std::path::{Path, PathBuf};

use crate::fs::FileSystem;
use crate::paths;

/// The two well-known filenames a source directory is probed for.
///
/// The settings file is authoritative when both exist; the plain config file
/// is the fallback. Hosts pick the names that match their ecosystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFilenames {
    pub settings: String,
    pub config: String,
}

impl Default for SourceFilenames {
    fn default() -> Self {
        Self {
            settings: "testwatch.toml".to_string(),
            config: "testwatch.conf.js".to_string(),
        }
    }
}

impl SourceFilenames {
    pub fn new(settings: impl Into<String>, config: impl Into<String>) -> Self {
        Self {
            settings: settings.into(),
            config: config.into(),
        }
    }
}

/// Resolved file roles for one container source.
///
/// `source` is the path the container is identified by. When the source is a
/// settings file, `config_file` starts as the sibling config file (if present
/// on disk) and may later be overridden by an explicit path declared inside
/// the settings. When the source is a plain config file there is no settings
/// file and the source doubles as the config file.
#[derive(Debug, Clone)]
pub struct ContainerSettings {
    source: PathBuf,
    settings_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
}

impl ContainerSettings {
    pub fn resolve(fs: &dyn FileSystem, source: &Path, filenames: &SourceFilenames) -> Self {
        let source = paths::normalize(source);
        let is_settings = source
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.eq_ignore_ascii_case(&filenames.settings))
            .unwrap_or(false);

        if is_settings {
            let settings_file = fs.is_file(&source).then(|| source.clone());
            let config_file = source
                .parent()
                .map(|dir| dir.join(&filenames.config))
                .filter(|p| fs.is_file(p));
            Self {
                source,
                settings_file,
                config_file,
            }
        } else {
            Self {
                config_file: Some(source.clone()),
                settings_file: None,
                source,
            }
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn settings_file(&self) -> Option<&Path> {
        self.settings_file.as_deref()
    }

    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    pub fn has_settings_file(&self) -> bool {
        self.settings_file.is_some()
    }

    /// Apply an explicit config-file path declared inside the settings file.
    /// Only meaningful for settings-bearing sources.
    pub fn override_config_file(&mut self, path: &Path) {
        if self.settings_file.is_some() {
            self.config_file = Some(paths::normalize(path));
        }
    }
}
