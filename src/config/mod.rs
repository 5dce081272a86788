//! Configuration module.
//!
//! Handles loading and validation of `fixcorpus` run configuration files.
//! Command-line flags override whatever a file provides.

pub mod loader;
pub mod schema;

pub use loader::{load_config, parse_config, substitute_env};
pub use schema::GenerationConfig;
