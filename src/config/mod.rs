// src/config/mod.rs

//! Configuration loading for `procpipe`.
//!
//! A config file is optional; every value has a default matching the
//! engine's built-in limits.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{ConfigFile, LaunchSection, OutputSection, RawConfigFile, WaitSection};
