//! settle - validated, layered application settings.
//!
//! This library provides the core of the `settle` CLI tool: per-domain
//! settings stores that combine compiled-in defaults, remote server settings
//! and locally persisted overrides, validate every candidate tree against a
//! domain schema, and only ever expose the last valid state.
//!
//! The usual entry point is a [`registry::StoreRegistry`] driven by an
//! [`initializer::AppInitializer`]:
//!
//! ```no_run
//! use settle::diagnostics::TracingDiagnostics;
//! use settle::initializer::AppInitializer;
//! use settle::persistence::FileStore;
//! use settle::registry::StoreRegistry;
//! use settle::remote::HttpRemote;
//! use settle::store::SettingsStore;
//! use std::sync::Arc;
//!
//! # fn main() -> settle::Result<()> {
//! let registry = StoreRegistry::new(
//!     Arc::new(FileStore::new("/var/lib/settle")),
//!     Arc::new(TracingDiagnostics),
//! )?;
//! let remote = HttpRemote::new("http://localhost:3000");
//! let report = AppInitializer::new(&registry, &remote).app_id("default").run();
//!
//! let dark = registry.ui().get("theme.dark");
//! # let _ = (report, dark);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod domains;
pub mod features;
pub mod i18n;
pub mod initializer;
pub mod persistence;
pub mod registry;
pub mod remote;
pub mod schema;
pub mod store;
pub mod tree;

use schema::{Violations, summarize};
use tree::PathError;

/// Library-level error type for settle operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Kdl(String),

    #[error("Settings rejected: {}", summarize(.0))]
    SchemaViolation(Violations),

    #[error("Failed to read persisted {0}")]
    PersistenceRead(String),

    #[error("Remote settings unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Invalid path: {0}")]
    Path(#[from] PathError),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Unknown domain: {0} (expected one of: ui, app, user, asset)")]
    UnknownDomain(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for settle operations.
pub type Result<T> = std::result::Result<T, Error>;
