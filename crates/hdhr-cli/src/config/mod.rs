//! Application configuration module.
//!
//! TOML config file merged with command line overrides into the settings
//! of one run.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::{AppConfig, Overrides, RunSettings};
pub use paths::resolve_config_path;
