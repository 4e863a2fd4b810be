//! Settings trees: nested JSON documents holding a domain's configuration.
//!
//! - [`path`] - typed key paths and the shared read/write tree walk
//! - [`merge`] - deep merge with later-wins-at-leaf semantics

pub mod merge;
pub mod path;

pub use merge::{deep_merge, merge_into};
pub use path::{KeyPath, PathError, PathSegment, get_path, set_path, type_name};

/// A settings tree. Always an object at the root for domain state.
pub type SettingsTree = serde_json::Value;

/// An empty settings tree (`{}`).
pub fn empty() -> SettingsTree {
    serde_json::Value::Object(serde_json::Map::new())
}
