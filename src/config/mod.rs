// src/config/mod.rs

//! Configuration snapshots and their loaders.
//!
//! The core never parses a host's settings format directly; it consumes an
//! immutable [`Configuration`] snapshot produced by a [`ConfigLoader`]. A
//! TOML-backed reference loader lives in [`loader`]; hosts with their own
//! settings formats implement the trait themselves.

pub mod loader;
pub mod model;

pub use loader::TomlConfigLoader;
pub use model::{ConfigLoader, Configuration, FileGroup};
