// src/container/mod.rs

//! Containers: units of test-source tracking rooted at one
//! settings-or-configuration file.
//!
//! A container owns a file index (path -> fingerprint), the set of active
//! filesystem watches derived from its configuration, and a last-modified
//! timestamp the host uses to decide whether to re-enumerate tests. Watch
//! notifications flow into [`Container::handle_event`], which decides between
//! "ignore", "structural change" (settings/config file edited) and "ordinary
//! change" (member file edited, refresh everything).

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::SystemTime;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::{ConfigLoader, Configuration};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::paths;
use crate::watch::planner::plan_watches;
use crate::watch::watcher::{ChangeReason, FileWatchDescriptor, spawn_watch};

pub mod index;
pub mod registry;
pub mod settings;

pub use index::FileIndex;
pub use registry::{ContainerRegistry, FsProjectOracle, ProjectFileOracle, SourceInfo};
pub use settings::{ContainerSettings, SourceFilenames};

/// Identifier of the project a container belongs to (host-assigned).
pub type ProjectId = String;

/// Scheme prefix of the stable string identity handed to the host.
pub const EXECUTOR_URI: &str = "executor://testwatch";

/// Signals emitted towards the external discovery layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// Re-run discovery for all containers. `reason` is free-text diagnostics.
    RefreshAll { reason: Option<String> },
    /// A settings/config file changed and its source still exists: the
    /// container for this source should be (re)created.
    SourceAppeared { source: PathBuf },
    /// A settings/config file changed and its source is gone: the container
    /// for this source should be removed.
    SourceRemoved { source: PathBuf },
}

struct ContainerState {
    index: FileIndex,
    timestamp: SystemTime,
}

/// One live test container.
///
/// Constructed by the [`ContainerRegistry`]; disposed explicitly through
/// [`dispose`](Self::dispose) (the registry does this for every removal
/// path). A disposed container ignores all further notifications.
pub struct Container {
    project: ProjectId,
    settings: ContainerSettings,
    config: Configuration,
    fs: Arc<dyn FileSystem>,
    state: Mutex<ContainerState>,
    watchers: Mutex<Vec<FileWatchDescriptor>>,
    disposed: AtomicBool,
    events: mpsc::UnboundedSender<DiscoveryEvent>,
}

impl Container {
    /// Build a container for `source`: load its configuration snapshot, seed
    /// the file index, and start its watches.
    ///
    /// Watch-setup failures are logged and skipped; partial watch coverage is
    /// preferred to failing construction. Configuration load failures do
    /// propagate, to be caught and logged at the registry boundary.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        loader: &dyn ConfigLoader,
        filenames: &SourceFilenames,
        project: ProjectId,
        source: &Path,
        events: mpsc::UnboundedSender<DiscoveryEvent>,
    ) -> Result<Arc<Self>> {
        let mut settings = ContainerSettings::resolve(&*fs, source, filenames);
        let config = loader.load(settings.source())?;
        if let Some(declared) = config.config_file() {
            settings.override_config_file(declared);
        }

        info!(source = %settings.source().display(), "creating test container");

        let container = Arc::new(Self {
            project,
            settings,
            config,
            fs,
            state: Mutex::new(ContainerState {
                index: FileIndex::new(),
                timestamp: SystemTime::now(),
            }),
            watchers: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
            events,
        });

        container.seed_index();
        container.start_watches();

        Ok(container)
    }

    fn seed_index(&self) {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for file in self.config.files() {
            state.index.set_current_hash(&*self.fs, file);
        }
        if let Some(settings_file) = self.settings.settings_file() {
            state.index.set_current_hash(&*self.fs, settings_file);
        }
        if let Some(config_file) = self.settings.config_file() {
            state.index.set_current_hash(&*self.fs, config_file);
        }
        debug!(
            source = %self.settings.source().display(),
            tracked = state.index.len(),
            "seeded file index"
        );
    }

    fn start_watches(self: &Arc<Self>) {
        let specs = plan_watches(
            self.config.file_groups(),
            self.settings.settings_file(),
            self.settings.config_file(),
        );

        let mut watchers = self
            .watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        for spec in specs {
            let weak: Weak<Self> = Arc::downgrade(self);
            let result = spawn_watch(&spec, move |event| {
                if let Some(container) = weak.upgrade() {
                    container.handle_event(&event.path, event.reason);
                }
            });
            match result {
                Ok(watcher) => {
                    info!(
                        "watching {:?} (filter {:?}, recursive {})",
                        spec.directory, spec.filter, spec.recursive
                    );
                    watchers.push(watcher);
                }
                Err(err) => {
                    // Reduced coverage beats a dead container.
                    warn!(
                        "skipping watch on {:?} (filter {:?}): {err}",
                        spec.directory, spec.filter
                    );
                }
            }
        }
    }

    /// React to one watch notification. Returns true when the notification
    /// produced an observable change.
    ///
    /// Non-throwing by design: every failure mode degrades to "no change" or
    /// a logged warning, never an error into the watch callback.
    pub fn handle_event(&self, path: &Path, reason: ChangeReason) -> bool {
        if self.disposed.load(Ordering::SeqCst) {
            return false;
        }

        let path = paths::normalize(path);
        let structural = self.is_singleton_path(&path);

        let changed = {
            let mut state = self
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            let mine =
                state.index.contains(&path) || self.config.has_file(&path) || structural;
            if !mine {
                return false;
            }

            // The filesystem decides what actually happened; the declared
            // reason only picks between re-hash and unconditional drop.
            let changed = match reason {
                ChangeReason::Added | ChangeReason::Changed | ChangeReason::Saved => {
                    state.index.set_current_hash(&*self.fs, &path)
                }
                ChangeReason::Removed => state.index.remove(&path),
            };

            if changed {
                state.timestamp = SystemTime::now();
            }
            changed
        };

        if !changed {
            // Duplicate or spurious notification.
            return false;
        }

        if structural {
            if self.fs.is_file(self.settings.source()) {
                self.send(DiscoveryEvent::SourceAppeared {
                    source: self.settings.source().to_path_buf(),
                });
            } else {
                self.send(DiscoveryEvent::SourceRemoved {
                    source: self.settings.source().to_path_buf(),
                });
            }
        } else {
            self.send(DiscoveryEvent::RefreshAll {
                reason: Some(change_description(reason, &path)),
            });
        }

        true
    }

    fn is_singleton_path(&self, path: &Path) -> bool {
        self.settings
            .settings_file()
            .map(|f| paths::paths_equal(f, path))
            .unwrap_or(false)
            || self
                .settings
                .config_file()
                .map(|f| paths::paths_equal(f, path))
                .unwrap_or(false)
    }

    fn send(&self, event: DiscoveryEvent) {
        if self.events.send(event).is_err() {
            warn!("discovery event receiver dropped; signal lost");
        }
    }

    /// Stop all watches and clear the index. Synchronous: once this returns,
    /// no further notifications reach this container.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut watchers = self
            .watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for mut watcher in watchers.drain(..) {
            info!(
                "stop watching {:?} (filter {:?})",
                watcher.spec().directory,
                watcher.spec().filter
            );
            watcher.dispose();
        }
        drop(watchers);

        let mut state = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        state.index.clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    pub fn source(&self) -> &Path {
        self.settings.source()
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Last-modified marker: bumped whenever a notification produced a real
    /// change. Hosts compare it to decide whether to re-enumerate tests.
    pub fn timestamp(&self) -> SystemTime {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .timestamp
    }

    /// Number of live watches (diagnostics and tests).
    pub fn watch_count(&self) -> usize {
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl fmt::Display for Container {
    /// Stable string identity used by hosts for equality and display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", EXECUTOR_URI, self.settings.source().display())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("source", &self.settings.source())
            .field("project", &self.project)
            .field("disposed", &self.disposed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

fn change_description(reason: ChangeReason, path: &Path) -> String {
    match reason {
        ChangeReason::Added => format!("File added:   {}", path.display()),
        ChangeReason::Changed | ChangeReason::Saved => {
            format!("File changed: {}", path.display())
        }
        ChangeReason::Removed => format!("File removed: {}", path.display()),
    }
}
