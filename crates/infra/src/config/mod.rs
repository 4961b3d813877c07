//! Configuration loading and management
//!
//! This module provides utilities for loading the authentication settings
//! from `.env`, environment variables and an optional TOML file, plus the
//! per-user paths the session and log files live under.

pub mod loader;
pub mod paths;

// Re-export commonly used items
pub use loader::{
    load, load_from_env, load_from_file, parse_settings_file, probe_config_paths, resolve,
    AuthSettings, SettingsFile,
};
pub use paths::{data_dir, default_log_dir, default_session_path};
