// src/container/registry.rs

//! The registry: the full set of live containers for a workspace.
//!
//! The registry owns container lifecycle (create, dedup, remove, clear) and
//! is the one surface the discovery layer talks to. The container list is
//! guarded by its own mutex; per-container file state is guarded by each
//! container's lock, so unrelated containers never serialize on each other.
//! Removals always snapshot the filtered set before mutating the list.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::ConfigLoader;
use crate::container::settings::SourceFilenames;
use crate::container::{Container, DiscoveryEvent, ProjectId};
use crate::fs::FileSystem;
use crate::paths;

/// External collaborator answering "is this path a member of this project".
/// Used to pick which candidate filename is the authoritative source for a
/// directory.
pub trait ProjectFileOracle: Send + Sync {
    fn has_file(&self, project: &str, path: &Path) -> bool;
}

/// Default oracle: any file that exists on the filesystem is a member.
#[derive(Debug, Clone)]
pub struct FsProjectOracle {
    fs: Arc<dyn FileSystem>,
}

impl FsProjectOracle {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl ProjectFileOracle for FsProjectOracle {
    fn has_file(&self, _project: &str, path: &Path) -> bool {
        self.fs.is_file(path)
    }
}

/// A candidate source location: a project plus the directory that may host a
/// settings or config file.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    project: ProjectId,
    source_directory: PathBuf,
}

impl SourceInfo {
    /// `path` may be the hosting directory itself or any file inside it.
    pub fn new(fs: &dyn FileSystem, project: impl Into<ProjectId>, path: &Path) -> Self {
        let path = paths::normalize(path);
        let source_directory = if fs.is_dir(&path) {
            path
        } else {
            path.parent().map(Path::to_path_buf).unwrap_or(path)
        };
        Self {
            project: project.into(),
            source_directory,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn source_directory(&self) -> &Path {
        &self.source_directory
    }

    /// The authoritative source file for this directory: the settings file if
    /// the project has one, else the config file, else nothing.
    pub fn resolve_source(
        &self,
        oracle: &dyn ProjectFileOracle,
        filenames: &SourceFilenames,
    ) -> Option<PathBuf> {
        [&filenames.settings, &filenames.config]
            .into_iter()
            .map(|name| self.source_directory.join(name))
            .find(|candidate| oracle.has_file(&self.project, candidate))
    }
}

/// Registry of all live containers for the current workspace.
pub struct ContainerRegistry {
    fs: Arc<dyn FileSystem>,
    loader: Arc<dyn ConfigLoader>,
    oracle: Arc<dyn ProjectFileOracle>,
    filenames: SourceFilenames,
    containers: Mutex<Vec<Arc<Container>>>,
    events: mpsc::UnboundedSender<DiscoveryEvent>,
}

impl ContainerRegistry {
    /// Build a registry and hand back the event stream the discovery layer
    /// subscribes to.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        loader: Arc<dyn ConfigLoader>,
        oracle: Arc<dyn ProjectFileOracle>,
        filenames: SourceFilenames,
    ) -> (Self, mpsc::UnboundedReceiver<DiscoveryEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        (
            Self {
                fs,
                loader,
                oracle,
                filenames,
                containers: Mutex::new(Vec::new()),
                events,
            },
            events_rx,
        )
    }

    /// Create (or re-create) the container for one source directory.
    ///
    /// A directory hosts at most one logical container, so anything already
    /// rooted inside the directory is removed first. Construction failures
    /// are logged per source and never abort the caller.
    pub fn create_container(&self, source: &SourceInfo) {
        self.remove_where_internal(|c| {
            paths::is_in_directory(c.source(), source.source_directory())
        });

        if let Some(resolved) = source.resolve_source(&*self.oracle, &self.filenames) {
            match Container::new(
                Arc::clone(&self.fs),
                &*self.loader,
                &self.filenames,
                source.project().to_string(),
                &resolved,
                self.events.clone(),
            ) {
                Ok(container) => {
                    self.lock_containers().push(container);
                }
                Err(err) => {
                    error!("Failed to create test container for {:?}: {err}", resolved);
                }
            }
        }

        self.remove_duplicates_internal();
        self.signal_refresh(None);
    }

    pub fn create_containers(&self, sources: &[SourceInfo]) {
        for source in sources {
            self.create_container(source);
        }
    }

    /// Drop settings-less containers shadowed by a settings-bearing container
    /// resolving to the same config file.
    ///
    /// Comparison is config-file *path* equality only; two distinct config
    /// files with identical member lists are deliberately not merged.
    pub fn remove_duplicates(&self) {
        if self.remove_duplicates_internal() > 0 {
            self.signal_refresh(None);
        }
    }

    fn remove_duplicates_internal(&self) -> usize {
        let snapshot = self.containers();
        let redundant: Vec<Arc<Container>> = snapshot
            .iter()
            .filter(|c| {
                !c.settings().has_settings_file()
                    && snapshot.iter().any(|d| {
                        d.settings().has_settings_file()
                            && matches!(
                                (c.settings().config_file(), d.settings().config_file()),
                                (Some(a), Some(b)) if paths::paths_equal(a, b)
                            )
                    })
            })
            .cloned()
            .collect();

        for container in &redundant {
            info!(source = %container.source().display(), "removing duplicate container");
            self.remove_container(container);
        }
        redundant.len()
    }

    /// Remove all containers belonging to `project`.
    pub fn remove_project(&self, project: &str) {
        let removed = self.remove_where_internal(|c| c.project() == project);
        if removed > 0 {
            self.signal_refresh(None);
        }
    }

    /// Remove the container identified by `source`.
    pub fn remove_source(&self, source: &Path) {
        let removed = self.remove_where_internal(|c| paths::paths_equal(c.source(), source));
        if removed > 0 {
            self.signal_refresh(None);
        }
    }

    /// Remove every container whose source matches one of `sources`.
    pub fn remove_sources(&self, sources: &[PathBuf]) {
        let removed = self.remove_where_internal(|c| {
            sources.iter().any(|s| paths::paths_equal(c.source(), s))
        });
        if removed > 0 {
            self.signal_refresh(None);
        }
    }

    /// Remove every container rooted inside `directory`.
    pub fn remove_from_directory(&self, directory: &Path) {
        let removed = self.remove_where_internal(|c| paths::is_in_directory(c.source(), directory));
        if removed > 0 {
            self.signal_refresh(None);
        }
    }

    /// Dispose everything; one refresh signal regardless of count.
    pub fn clear(&self) {
        self.remove_where_internal(|_| true);
        self.signal_refresh(None);
    }

    /// Snapshot of the live container list.
    pub fn containers(&self) -> Vec<Arc<Container>> {
        self.lock_containers().clone()
    }

    pub fn len(&self) -> usize {
        self.lock_containers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_containers().is_empty()
    }

    /// Remove matching containers without signaling. The match set is
    /// materialized before any removal so the list is never mutated while it
    /// is being enumerated.
    fn remove_where_internal<F>(&self, pred: F) -> usize
    where
        F: Fn(&Container) -> bool,
    {
        let to_remove: Vec<Arc<Container>> = self
            .lock_containers()
            .iter()
            .filter(|c| pred(c.as_ref()))
            .cloned()
            .collect();

        for container in &to_remove {
            self.remove_container(container);
        }
        to_remove.len()
    }

    fn remove_container(&self, container: &Arc<Container>) {
        // Identity is the normalized source path, not the Arc pointer.
        let key = paths::path_key(container.source());
        self.lock_containers()
            .retain(|c| paths::path_key(c.source()) != key);
        container.dispose();
    }

    fn signal_refresh(&self, reason: Option<String>) {
        if self
            .events
            .send(DiscoveryEvent::RefreshAll { reason })
            .is_err()
        {
            warn!("discovery event receiver dropped; refresh signal lost");
        }
    }

    fn lock_containers(&self) -> std::sync::MutexGuard<'_, Vec<Arc<Container>>> {
        self.containers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ContainerRegistry {
    fn drop(&mut self) {
        // Explicit teardown for every owner; no finalizer fallback.
        for container in self.containers() {
            container.dispose();
        }
    }
}
