//! Storage infrastructure: settings file persistence.
//!
//! The `settings` sub-module reads `notify.toml` from the platform config
//! directory, writes it back, and falls back to defaults on first run.

pub mod settings;
