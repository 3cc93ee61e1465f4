//! Configuration file parsing for Pusher
//!
//! Supports `<config_dir>/pusher/config.toml` (or an explicit `--config`
//! path) with `[simctl]`, `[engine]` and `[payload]` sections.

pub mod settings;
pub mod types;

pub use settings::{default_config_path, load_payload_file, load_settings};
pub use types::*;
