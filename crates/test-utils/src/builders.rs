#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use testwatch::config::{ConfigLoader, Configuration, FileGroup};
use testwatch::errors::{Result, TestWatchError};
use testwatch::paths;

/// Builder for `Configuration` snapshots to simplify test setup.
pub struct ConfigurationBuilder {
    source: PathBuf,
    config_file: Option<PathBuf>,
    groups: Vec<FileGroup>,
    files: Vec<PathBuf>,
}

impl ConfigurationBuilder {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            config_file: None,
            groups: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_group(mut self, directory: impl Into<PathBuf>, filter: &str) -> Self {
        self.groups.push(FileGroup::new(directory, filter));
        self
    }

    pub fn with_member(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    pub fn build(self) -> Configuration {
        Configuration::new(self.source, self.config_file, self.groups, self.files)
    }
}

/// `ConfigLoader` serving pre-built snapshots keyed by source path.
///
/// Sources without a registered snapshot fail to load, which doubles as a
/// way to exercise the registry's construction-failure path.
#[derive(Default)]
pub struct StaticConfigLoader {
    configs: Mutex<HashMap<String, Configuration>>,
}

impl StaticConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, config: Configuration) {
        let key = paths::path_key(config.source());
        self.configs.lock().unwrap().insert(key, config);
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, source: &Path) -> Result<Configuration> {
        let configs = self.configs.lock().unwrap();
        configs
            .get(&paths::path_key(source))
            .cloned()
            .ok_or_else(|| {
                TestWatchError::ConfigError(format!("no configuration registered for {:?}", source))
            })
    }
}
