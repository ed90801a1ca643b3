//! Configuration module
//!
//! Handles user configuration (`config.toml` in the platform config directory)
//! and the location of Claude's data directory.

mod settings;

pub use settings::*;
