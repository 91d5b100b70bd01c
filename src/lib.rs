// src/lib.rs

//! testwatch: keeps a workspace's test containers in sync with the
//! filesystem.
//!
//! A *container* is one project's test configuration, rooted at a settings or
//! config file. The crate watches the directories the configuration names,
//! fingerprints file contents to tell real edits from spurious notifications,
//! and tells the host's discovery layer when to refresh:
//!
//! - an ordinary member file changed -> refresh everything;
//! - the settings/config file itself changed -> rebuild or remove that one
//!   container, depending on whether its source still exists.
//!
//! The host drives the [`container::ContainerRegistry`] (create, remove,
//! clear) and consumes [`container::DiscoveryEvent`]s from the channel handed
//! out at registry construction. Settings parsing, test discovery, and test
//! execution stay on the host's side of the
//! [`config::ConfigLoader`] / [`container::ProjectFileOracle`] seams.

pub mod config;
pub mod container;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod paths;
pub mod watch;

pub use config::{ConfigLoader, Configuration, FileGroup, TomlConfigLoader};
pub use container::{
    Container, ContainerRegistry, ContainerSettings, DiscoveryEvent, EXECUTOR_URI,
    FsProjectOracle, ProjectFileOracle, SourceFilenames, SourceInfo,
};
pub use errors::{Result, TestWatchError};
pub use watch::{ChangeReason, FileFingerprint, WatchSpec};
