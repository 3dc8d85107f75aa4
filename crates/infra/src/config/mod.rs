//! Configuration loading and management
//!
//! This module provides utilities for loading the host configuration
//! from environment variables and files.

pub mod loader;

// Re-export commonly used items
pub use loader::{apply_env, load, load_from_file, parse_utc_offset, probe_config_paths};
