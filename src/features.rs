//! Feature-flag lookups over the app domain's `features` tree.
//!
//! Features live at dotted paths under `features`, e.g. `core.pwa` or
//! `ui.layout.quickMenu`. A feature resolves as enabled when:
//!
//! - it is marked `required: true` (required features cannot be switched off), or
//! - its `enabled` flag is `true` and every feature listed in its
//!   `dependencies` is itself enabled.
//!
//! Unknown or malformed paths resolve as disabled; lookups never fail.

use crate::store::SettingsStore;
use crate::tree::{KeyPath, get_path};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// Why a feature resolved the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "kebab-case")]
pub enum FeatureReason {
    /// No feature object at this path (or the path is malformed)
    NotFound,
    /// Marked required; always on
    Required,
    /// `enabled: true` and all dependencies on
    Enabled,
    /// `enabled` is false or missing
    Disabled,
    /// A dependency is off (names the first one found)
    DependencyDisabled(String),
    /// Dependencies form a cycle through this path
    DependencyCycle(String),
}

/// The resolved state of one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureState {
    pub path: String,
    pub enabled: bool,
    #[serde(flatten)]
    pub reason: FeatureReason,
}

/// Resolve features against a `features` subtree.
#[derive(Debug, Clone, Copy)]
pub struct FeatureFlags<'a> {
    features: &'a Value,
}

impl<'a> FeatureFlags<'a> {
    pub fn new(features: &'a Value) -> Self {
        Self { features }
    }

    pub fn is_enabled(&self, path: &str) -> bool {
        self.state(path).enabled
    }

    pub fn state(&self, path: &str) -> FeatureState {
        let mut visiting = HashSet::new();
        let reason = self.resolve(path, &mut visiting);
        FeatureState {
            path: path.to_string(),
            enabled: matches!(reason, FeatureReason::Required | FeatureReason::Enabled),
            reason,
        }
    }

    fn lookup(&self, path: &str) -> Option<&'a serde_json::Map<String, Value>> {
        let key_path = KeyPath::parse(path).ok()?;
        get_path(self.features, &key_path).ok().flatten()?.as_object()
    }

    fn resolve(&self, path: &str, visiting: &mut HashSet<String>) -> FeatureReason {
        let Some(feature) = self.lookup(path) else {
            return FeatureReason::NotFound;
        };

        if feature.get("required").and_then(Value::as_bool) == Some(true) {
            return FeatureReason::Required;
        }
        if feature.get("enabled").and_then(Value::as_bool) != Some(true) {
            return FeatureReason::Disabled;
        }

        if !visiting.insert(path.to_string()) {
            return FeatureReason::DependencyCycle(path.to_string());
        }
        let dependencies = feature
            .get("dependencies")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for dependency in dependencies.iter().filter_map(Value::as_str) {
            match self.resolve(dependency, visiting) {
                FeatureReason::Required | FeatureReason::Enabled => {}
                FeatureReason::DependencyCycle(at) => {
                    visiting.remove(path);
                    return FeatureReason::DependencyCycle(at);
                }
                _ => {
                    visiting.remove(path);
                    return FeatureReason::DependencyDisabled(dependency.to_string());
                }
            }
        }
        visiting.remove(path);
        FeatureReason::Enabled
    }
}

/// Resolve `path` against the `features` tree of an app store.
pub fn feature_state(app: &dyn SettingsStore, path: &str) -> FeatureState {
    let features = app.get("features").unwrap_or(Value::Null);
    FeatureFlags::new(&features).state(path)
}

/// Shorthand for `feature_state(app, path).enabled`.
pub fn is_feature_enabled(app: &dyn SettingsStore, path: &str) -> bool {
    feature_state(app, path).enabled
}
