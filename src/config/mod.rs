//! Tool configuration for settle.
//!
//! ## config.kdl - Tool preferences
//!
//! Located at `<data-dir>/config.kdl`, next to the persisted settings.
//!
//! Contains:
//! - `app-id` - Application identifier sent to the settings server
//! - `language` - Language tag used for sync and localization
//! - `server-url` - Base URL of the settings server
//! - `timeout-ms` - Remote fetch timeout (1-120000)
//! - `output-format` - "json" or "human"
//!
//! ## Precedence
//!
//! CLI flag > environment variable > config.kdl > defaults
//!
//! Use the [`resolver`] module for precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    ConfigOverrides, DATA_DIR_ENV, Resolved, ResolvedConfig, ValueSource, config_path,
    resolve_config, resolve_config_with, resolve_data_dir, resolve_data_dir_with,
};
pub use schema::{CONFIG_FILE, CONFIG_KEYS, OutputFormat, SettleConfig};
