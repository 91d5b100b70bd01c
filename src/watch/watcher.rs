// src/watch/watcher.rs

use std::path::PathBuf;

use globset::Glob;
use notify::event::{AccessKind, AccessMode, EventKind};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use crate::errors::{Result, TestWatchError};
use crate::paths;
use crate::watch::planner::WatchSpec;

/// Why a watched file changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    Added,
    Changed,
    Saved,
    Removed,
}

/// One notification for one matching path.
#[derive(Debug, Clone)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub reason: ChangeReason,
}

/// One active watch over a directory, filtered by a filename glob.
///
/// Holds the underlying `notify` watcher alive; [`dispose`](Self::dispose)
/// (or dropping the descriptor) synchronously stops event delivery.
pub struct FileWatchDescriptor {
    spec: WatchSpec,
    inner: RecommendedWatcher,
}

impl std::fmt::Debug for FileWatchDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatchDescriptor")
            .field("spec", &self.spec)
            .finish()
    }
}

impl FileWatchDescriptor {
    pub fn spec(&self) -> &WatchSpec {
        &self.spec
    }

    /// Stop watching. Synchronous: once this returns, no further events are
    /// delivered to the handler.
    pub fn dispose(&mut self) {
        if let Err(err) = self.inner.unwatch(&self.spec.directory) {
            warn!(
                "failed to unwatch {:?}: {err} (watcher is dropped regardless)",
                self.spec.directory
            );
        }
    }
}

/// Start a watch for `spec`, invoking `on_event` for every matching path.
///
/// The handler runs on the watcher's own thread and must not panic; callers
/// wire it to a non-throwing notification handler.
pub fn spawn_watch<F>(spec: &WatchSpec, on_event: F) -> Result<FileWatchDescriptor>
where
    F: Fn(WatchEvent) + Send + 'static,
{
    let matcher = Glob::new(&spec.filter)
        .map_err(|e| TestWatchError::ConfigError(format!("invalid filter {:?}: {e}", spec.filter)))?
        .compile_matcher();

    let directory = spec.directory.clone();
    let recursive = spec.recursive;

    let mut watcher = RecommendedWatcher::new(
        {
            let directory = directory.clone();
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let Some(reason) = change_reason(&event.kind) else {
                        return;
                    };
                    for path in event.paths {
                        let name_matches =
                            path.file_name().map(|n| matcher.is_match(n)).unwrap_or(false);
                        if !name_matches {
                            continue;
                        }
                        let in_scope = match path.parent() {
                            Some(parent) if recursive => {
                                paths::paths_equal(parent, &directory)
                                    || paths::is_proper_ancestor(&directory, parent)
                            }
                            Some(parent) => paths::paths_equal(parent, &directory),
                            None => false,
                        };
                        if in_scope {
                            debug!(?path, ?reason, "watch event");
                            on_event(WatchEvent { path, reason });
                        }
                    }
                }
                Err(err) => {
                    warn!("file watch error: {err}");
                }
            }
        },
        Config::default(),
    )?;

    let mode = if recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    watcher.watch(&directory, mode)?;

    Ok(FileWatchDescriptor {
        spec: spec.clone(),
        inner: watcher,
    })
}

fn change_reason(kind: &EventKind) -> Option<ChangeReason> {
    match kind {
        EventKind::Create(_) => Some(ChangeReason::Added),
        EventKind::Modify(_) => Some(ChangeReason::Changed),
        EventKind::Remove(_) => Some(ChangeReason::Removed),
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => Some(ChangeReason::Saved),
        EventKind::Access(_) => None,
        EventKind::Any | EventKind::Other => Some(ChangeReason::Changed),
    }
}
