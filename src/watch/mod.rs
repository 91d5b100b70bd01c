// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Content fingerprinting so real changes can be told apart from spurious
//!   notifications.
//! - Planning the minimal non-overlapping watch set for a container.
//! - Wiring up cross-platform filesystem watches (`notify`).
//!
//! It does **not** know about containers or the registry; it only turns
//! filesystem changes into per-path notifications.

pub mod hash;
pub mod planner;
pub mod watcher;

pub use hash::{FileFingerprint, fingerprint_file};
pub use planner::{WatchSpec, plan_watches};
pub use watcher::{ChangeReason, FileWatchDescriptor, WatchEvent, spawn_watch};
