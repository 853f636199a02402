//! Application configuration module.
//!
//! TOML config file for API credentials, the search-count backend and
//! search tuning, with environment variable overrides.

#[allow(clippy::module_inception)]
mod config;
mod paths;

#[allow(clippy::module_name_repetitions)]
pub use config::{AppConfig, ResolvedAppwrite, ResolvedConfig, ResolvedStore};
pub use paths::resolve_config_path;
