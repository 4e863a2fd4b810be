//! Validated settings stores, one per domain.
//!
//! A store owns the current validated tree for its domain and moves through
//! two states: unloaded (holding defaults) and loaded. Every mutation builds
//! a complete candidate tree, validates the whole candidate and only then
//! swaps it in, so readers observe either the old tree or the new tree.
//!
//! ## Layer priority (lowest to highest)
//!
//! 1. Compiled-in defaults (the initial state)
//! 2. The last committed tree, persisted under the domain key. It only seeds
//!    the first load, so a restart without network reflects the last sync.
//! 3. Remote settings passed to [`SettingsStore::initialize_with_settings`]
//! 4. Local overrides, persisted under [`overrides_key`]. Only
//!    [`SettingsStore::update_settings`] writes them, and they hold nothing
//!    but the paths the user changed.
//!
//! Recoverable failures (corrupt persisted JSON, validation failures, write
//! errors) are reported to the store's [`Diagnostics`] sink and never
//! returned from `initialize_with_settings`.

use crate::diagnostics::Diagnostics;
use crate::domains::{Domain, DomainSettings};
use crate::persistence::Persistence;
use crate::schema::validator::summarize;
use crate::schema::{Validator, ValidatorCache, Violation, Violations};
use crate::tree::{self, KeyPath, deep_merge, get_path, set_path};
use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockWriteGuard, Weak};

/// Persistence key holding the local overrides of `domain`.
pub fn overrides_key(domain: Domain) -> String {
    format!("{}-overrides", domain.as_str())
}

/// Snapshot of a store's state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    /// Current validated settings tree
    pub settings: Value,
    /// Whether `initialize_with_settings` has run at least once
    pub is_loaded: bool,
    /// Violations from the last rejected candidate, if any
    pub validation_errors: Option<Violations>,
}

impl StoreState {
    fn new(defaults: Value) -> Self {
        Self {
            settings: defaults,
            is_loaded: false,
            validation_errors: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors.as_ref().is_none_or(Vec::is_empty)
    }
}

/// Result of initializing (or resetting) a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "violations", rename_all = "lowercase")]
pub enum InitOutcome {
    /// The merged tree was valid and is now the live state.
    Committed,
    /// The merged tree was invalid; the previous state was kept.
    Rejected(Violations),
}

impl InitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, InitOutcome::Committed)
    }
}

/// Callback invoked after every successful commit with the new tree.
pub type Listener = Arc<dyn Fn(Domain, &Value) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Handle returned by [`SettingsStore::subscribe`].
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the listener. Returns false if the store is gone or the
    /// listener was already removed.
    pub fn unsubscribe(self) -> bool {
        let Some(listeners) = self.listeners.upgrade() else {
            return false;
        };
        let mut listeners = listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.entries.len();
        listeners.entries.retain(|(id, _)| *id != self.id);
        listeners.entries.len() < before
    }
}

/// Object-safe interface over a domain store.
pub trait SettingsStore: Send + Sync {
    fn domain(&self) -> Domain;

    /// A copy of the full store state.
    fn snapshot(&self) -> StoreState;

    /// A copy of the current settings tree.
    fn settings(&self) -> Value;

    /// Read the value at a dotted path. Absent and malformed paths yield `None`.
    fn get(&self, path: &str) -> Option<Value>;

    fn is_loaded(&self) -> bool;

    /// True when the last candidate was accepted (no recorded violations).
    fn is_valid(&self) -> bool;

    fn validation_errors(&self) -> Option<Violations>;

    /// Merge `current < remote < local overrides`, validate and commit if
    /// valid. On the first load `current` is the defaults overlaid with the
    /// last persisted tree.
    ///
    /// Always marks the store loaded. Never fails: rejections are returned
    /// as [`InitOutcome::Rejected`] and reported to diagnostics.
    fn initialize_with_settings(&self, remote: &Value) -> InitOutcome;

    /// Bootstrap from defaults, the last committed tree and local overrides.
    fn initialize(&self) -> InitOutcome {
        self.initialize_with_settings(&tree::empty())
    }

    /// Replace the value at a dotted `path` and commit if the whole tree
    /// stays valid. On rejection the live state is untouched and the
    /// violations are returned as [`Error::SchemaViolation`].
    fn update_settings(&self, path: &str, value: Value) -> Result<()>;

    /// Restore the domain defaults and drop the local overrides.
    fn reset(&self) -> InitOutcome;

    /// Register a listener called after each successful commit.
    fn subscribe(&self, listener: Listener) -> Subscription;
}

/// A store for the domain described by `D`.
pub struct ValidatedStore<D: DomainSettings> {
    state: RwLock<StoreState>,
    validator: Arc<Validator>,
    persistence: Arc<dyn Persistence>,
    diagnostics: Arc<dyn Diagnostics>,
    listeners: Arc<Mutex<Listeners>>,
    _domain: PhantomData<fn() -> D>,
}

impl<D: DomainSettings> std::fmt::Debug for ValidatedStore<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedStore")
            .field("domain", &D::DOMAIN)
            .field("state", &self.snapshot())
            .finish()
    }
}

impl<D: DomainSettings> ValidatedStore<D> {
    /// Create an unloaded store holding `D::defaults()`.
    ///
    /// The schema is compiled through `validators`, so stores of the same
    /// domain share one compiled validator.
    pub fn new(
        validators: &ValidatorCache,
        persistence: Arc<dyn Persistence>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self> {
        let validator = validators.get_or_compile(D::DOMAIN, D::schema)?;
        Ok(Self {
            state: RwLock::new(StoreState::new(D::defaults())),
            validator,
            persistence,
            diagnostics,
            listeners: Arc::new(Mutex::new(Listeners::default())),
            _domain: PhantomData,
        })
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persisted tree under `key`; anything unreadable counts as `{}`.
    fn read_tree(&self, key: &str) -> Value {
        let text = match self.persistence.get(key) {
            Ok(Some(text)) => text,
            Ok(None) => return tree::empty(),
            Err(e) => {
                self.warn_read(format!("{} settings: {}", key, e));
                return tree::empty();
            }
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(value @ Value::Object(_)) => value,
            Ok(other) => {
                self.warn_read(format!(
                    "{} settings: expected an object, found {}",
                    key,
                    tree::type_name(&other)
                ));
                tree::empty()
            }
            Err(e) => {
                self.warn_read(format!("{} settings: {}", key, e));
                tree::empty()
            }
        }
    }

    fn read_overrides(&self) -> Value {
        self.read_tree(&overrides_key(D::DOMAIN))
    }

    fn warn_read(&self, detail: String) {
        self.diagnostics.warn(&Error::PersistenceRead(detail).to_string());
    }

    fn persist(&self, key: &str, tree: &Value) {
        let written = serde_json::to_string_pretty(tree)
            .map_err(Error::from)
            .and_then(|json| self.persistence.set(key, &json));
        if let Err(e) = written {
            self.diagnostics.error(&format!("failed to persist {}: {}", key, e));
        }
    }

    fn notify(&self, settings: &Value) {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(D::DOMAIN, settings);
        }
    }

    /// Validate `candidate` and commit it, or record the violations.
    ///
    /// A commit persists the full tree and, when given, the new local
    /// overrides. The write guard is released before listeners run so they
    /// can read the store.
    fn commit(
        &self,
        mut state: RwLockWriteGuard<'_, StoreState>,
        candidate: Value,
        overrides: Option<&Value>,
    ) -> std::result::Result<(), Violations> {
        let result = self.validator.check(&candidate);
        if !result.is_ok() {
            return Err(self.reject(state, result.violations));
        }

        state.settings = candidate;
        state.validation_errors = None;
        let committed = state.settings.clone();
        self.persist(D::DOMAIN.as_str(), &committed);
        if let Some(overrides) = overrides {
            self.persist(&overrides_key(D::DOMAIN), overrides);
        }
        drop(state);

        tracing::debug!(domain = D::DOMAIN.as_str(), "settings committed");
        self.notify(&committed);
        Ok(())
    }

    fn reject(
        &self,
        mut state: RwLockWriteGuard<'_, StoreState>,
        violations: Violations,
    ) -> Violations {
        self.diagnostics.warn(&format!(
            "{} settings rejected: {}",
            D::DOMAIN,
            summarize(&violations)
        ));
        state.validation_errors = Some(violations.clone());
        violations
    }
}

/// The local override recorded for a write at `path`, taken from the
/// committed `candidate`.
///
/// Merges replace arrays wholesale, so a write inside an array records the
/// whole array. `max_depth` caps the number of segments kept.
fn override_entry(candidate: &Value, path: &KeyPath, max_depth: usize) -> (KeyPath, Value) {
    let mut entry = KeyPath::root();
    for segment in path.segments().iter().take(max_depth) {
        match get_path(candidate, &entry) {
            Ok(Some(Value::Object(_))) => entry = entry.child(segment.clone()),
            _ => break,
        }
    }
    let value = get_path(candidate, &entry)
        .ok()
        .flatten()
        .cloned()
        .unwrap_or(Value::Null);
    (entry, value)
}

impl<D: DomainSettings> SettingsStore for ValidatedStore<D> {
    fn domain(&self) -> Domain {
        D::DOMAIN
    }

    fn snapshot(&self) -> StoreState {
        self.read_state().clone()
    }

    fn settings(&self) -> Value {
        self.read_state().settings.clone()
    }

    fn get(&self, path: &str) -> Option<Value> {
        let path = KeyPath::parse(path).ok()?;
        let state = self.read_state();
        get_path(&state.settings, &path).ok().flatten().cloned()
    }

    fn is_loaded(&self) -> bool {
        self.read_state().is_loaded
    }

    fn is_valid(&self) -> bool {
        self.read_state().is_valid()
    }

    fn validation_errors(&self) -> Option<Violations> {
        self.read_state().validation_errors.clone()
    }

    fn initialize_with_settings(&self, remote: &Value) -> InitOutcome {
        // Read persistence before taking the lock; the merge itself is atomic
        let last_committed = if self.is_loaded() {
            None
        } else {
            Some(self.read_tree(D::DOMAIN.as_str()))
        };
        let overrides = self.read_overrides();

        let mut state = self.write_state();
        let base = match last_committed {
            Some(ref last) if !state.is_loaded => deep_merge(&[&state.settings, last]),
            _ => state.settings.clone(),
        };
        state.is_loaded = true;
        let merged = deep_merge(&[&base, remote, &overrides]);

        match self.commit(state, merged, None) {
            Ok(()) => InitOutcome::Committed,
            Err(violations) => InitOutcome::Rejected(violations),
        }
    }

    fn update_settings(&self, path: &str, value: Value) -> Result<()> {
        let state = self.write_state();

        let key_path = match KeyPath::parse(path) {
            Ok(key_path) => key_path,
            Err(e) => {
                let violation = Violation::new(e.location(), e.to_string());
                return Err(Error::SchemaViolation(self.reject(state, vec![violation])));
            }
        };

        let mut candidate = state.settings.clone();
        if let Err(e) = set_path(&mut candidate, &key_path, value) {
            let violation = Violation::new(e.location(), e.to_string());
            return Err(Error::SchemaViolation(self.reject(state, vec![violation])));
        }

        let mut overrides = self.read_overrides();
        let (entry, entry_value) = override_entry(&candidate, &key_path, usize::MAX);
        if let Err(e) = set_path(&mut overrides, &entry, entry_value) {
            // The overrides file disagrees with the live tree; widen to the top-level key
            self.diagnostics.warn(&format!("{}: {}", overrides_key(D::DOMAIN), e));
            let (entry, entry_value) = override_entry(&candidate, &key_path, 1);
            set_path(&mut overrides, &entry, entry_value)?;
        }

        match self.commit(state, candidate, Some(&overrides)) {
            Ok(()) => Ok(()),
            Err(violations) => Err(Error::SchemaViolation(violations)),
        }
    }

    fn reset(&self) -> InitOutcome {
        let state = self.write_state();
        match self.commit(state, D::defaults(), Some(&tree::empty())) {
            Ok(()) => InitOutcome::Committed,
            Err(violations) => InitOutcome::Rejected(violations),
        }
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.next_id += 1;
        let id = listeners.next_id;
        listeners.entries.push((id, listener));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::domains::{UiSettings, UserSettings};
    use crate::persistence::MemoryStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixture {
        persistence: Arc<MemoryStore>,
        diagnostics: Arc<RecordingDiagnostics>,
        validators: ValidatorCache,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_persistence(MemoryStore::new())
        }

        fn with_persistence(persistence: MemoryStore) -> Self {
            Self {
                persistence: Arc::new(persistence),
                diagnostics: Arc::new(RecordingDiagnostics::new()),
                validators: ValidatorCache::new(),
            }
        }

        fn store<D: DomainSettings>(&self) -> ValidatedStore<D> {
            ValidatedStore::new(
                &self.validators,
                self.persistence.clone(),
                self.diagnostics.clone(),
            )
            .unwrap()
        }

        fn persisted(&self, key: &str) -> Option<Value> {
            self.persistence
                .raw(key)
                .map(|text| serde_json::from_str(&text).unwrap())
        }
    }

    #[test]
    fn test_new_store_is_unloaded_defaults() {
        let fixture = Fixture::new();
        let store = fixture.store::<UiSettings>();
        let state = store.snapshot();
        assert!(!state.is_loaded);
        assert!(state.is_valid());
        assert_eq!(state.settings, UiSettings::defaults());
        assert_eq!(store.domain(), Domain::Ui);
    }

    #[test]
    fn test_initialize_commits_and_persists() {
        let fixture = Fixture::new();
        let store = fixture.store::<UiSettings>();

        let outcome = store.initialize_with_settings(&json!({"theme": {"dark": true}}));

        assert_eq!(outcome, InitOutcome::Committed);
        assert!(store.is_loaded());
        assert!(store.is_valid());
        assert_eq!(store.get("theme.dark"), Some(json!(true)));
        assert_eq!(store.get("theme.primary"), Some(json!("#1976D2")));
        assert_eq!(fixture.persisted("ui"), Some(store.settings()));
    }

    #[test]
    fn test_remote_applies_after_bootstrap() {
        let fixture = Fixture::new();
        let store = fixture.store::<UiSettings>();
        store.initialize();
        assert_eq!(fixture.persisted("ui"), Some(UiSettings::defaults()));

        let outcome = store.initialize_with_settings(&json!({"theme": {"dark": true}}));

        assert!(outcome.is_committed());
        assert_eq!(store.get("theme.dark"), Some(json!(true)));
        assert_eq!(fixture.persisted("ui-overrides"), None);
    }

    #[test]
    fn test_last_committed_tree_seeds_first_load_only() {
        let fixture = Fixture::with_persistence(
            MemoryStore::new().with_entry("ui", r#"{"theme": {"dark": true}}"#),
        );
        let store = fixture.store::<UiSettings>();

        store.initialize();
        assert_eq!(store.get("theme.dark"), Some(json!(true)));

        store.initialize_with_settings(&json!({"theme": {"dark": false}}));
        assert_eq!(store.get("theme.dark"), Some(json!(false)));
        assert_eq!(fixture.persisted("ui").unwrap()["theme"]["dark"], json!(false));
    }

    #[test]
    fn test_invalid_remote_rejected_after_bootstrap() {
        let fixture = Fixture::new();
        let store = fixture.store::<UiSettings>();
        store.initialize();
        let before = store.settings();

        let outcome = store.initialize_with_settings(&json!({"leftDrawer": {"width": -5}}));

        assert!(!outcome.is_committed());
        assert_eq!(store.settings(), before);
        assert_eq!(fixture.persisted("ui"), Some(before));
    }

    #[test]
    fn test_local_overrides_remote() {
        let fixture = Fixture::with_persistence(
            MemoryStore::new()
                .with_entry("ui-overrides", r##"{"theme": {"primary": "#000000"}}"##),
        );
        let store = fixture.store::<UiSettings>();

        store.initialize_with_settings(&json!({
            "theme": {"primary": "#FF0000", "secondary": "#00FF00"}
        }));

        assert_eq!(store.get("theme.primary"), Some(json!("#000000")));
        assert_eq!(store.get("theme.secondary"), Some(json!("#00FF00")));
        assert_eq!(store.get("theme.accent"), Some(json!("#9C27B0")));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let fixture = Fixture::new();
        let store = fixture.store::<UiSettings>();

        store.initialize();
        let once = store.snapshot();
        store.initialize();
        assert_eq!(store.snapshot(), once);
    }

    #[test]
    fn test_invalid_remote_keeps_state_but_marks_loaded() {
        let fixture = Fixture::new();
        let store = fixture.store::<UiSettings>();
        let before = store.settings();

        let outcome = store.initialize_with_settings(&json!({"leftDrawer": {"width": -5}}));

        let InitOutcome::Rejected(violations) = outcome else {
            panic!("expected rejection");
        };
        assert_eq!(violations[0].path, "leftDrawer.width");
        assert!(store.is_loaded());
        assert!(!store.is_valid());
        assert_eq!(store.settings(), before);
        assert_eq!(fixture.persisted("ui"), None);
        assert_eq!(fixture.diagnostics.warnings().len(), 1);
    }

    #[test]
    fn test_corrupt_persisted_json_is_ignored() {
        let fixture =
            Fixture::with_persistence(MemoryStore::new().with_entry("user", "{not json"));
        let store = fixture.store::<UserSettings>();

        let outcome = store.initialize();

        assert!(outcome.is_committed());
        assert_eq!(store.settings(), UserSettings::defaults());
        let warnings = fixture.diagnostics.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("user settings"));
    }

    #[test]
    fn test_non_object_persisted_json_is_ignored() {
        let fixture = Fixture::with_persistence(MemoryStore::new().with_entry("user", "[1, 2]"));
        let store = fixture.store::<UserSettings>();

        assert!(store.initialize().is_committed());
        assert!(fixture.diagnostics.warnings()[0].contains("expected an object, found array"));
    }

    #[test]
    fn test_update_changes_only_target_leaf() {
        let fixture = Fixture::new();
        let store = fixture.store::<UiSettings>();
        store.initialize();
        let before = store.settings();

        store.update_settings("leftDrawer.width", json!(300)).unwrap();

        let mut expected = before.clone();
        expected["leftDrawer"]["width"] = json!(300);
        assert_eq!(store.settings(), expected);
        assert!(store.is_valid());
        assert_eq!(fixture.persisted("ui"), Some(expected));
        assert_eq!(
            fixture.persisted("ui-overrides"),
            Some(json!({"leftDrawer": {"width": 300}}))
        );
    }

    #[test]
    fn test_update_inside_array_records_whole_array() {
        let fixture = Fixture::with_persistence(
            MemoryStore::new().with_entry("user", r#"{"permissions": ["read", "write"]}"#),
        );
        let store = fixture.store::<UserSettings>();
        store.initialize();

        store.update_settings("permissions[1]", json!("admin")).unwrap();

        assert_eq!(
            fixture.persisted("user-overrides"),
            Some(json!({"permissions": ["read", "admin"]}))
        );
    }

    #[test]
    fn test_update_survives_remote_sync() {
        let fixture = Fixture::new();
        let store = fixture.store::<UiSettings>();
        store.initialize();
        store.update_settings("theme.dark", json!(true)).unwrap();

        store.initialize_with_settings(&json!({"theme": {"dark": false, "primary": "#FF0000"}}));

        assert_eq!(store.get("theme.dark"), Some(json!(true)));
        assert_eq!(store.get("theme.primary"), Some(json!("#FF0000")));
    }

    #[test]
    fn test_rejected_update_is_atomic() {
        let fixture = Fixture::new();
        let store = fixture.store::<UiSettings>();
        store.initialize();
        let before = store.settings();
        let persisted_before = fixture.persisted("ui");

        let err = store
            .update_settings("leftDrawer.behavior", json!("floating"))
            .unwrap_err();

        let Error::SchemaViolation(violations) = err else {
            panic!("expected schema violation");
        };
        assert_eq!(violations[0].path, "leftDrawer.behavior");
        assert_eq!(store.settings(), before);
        assert_eq!(fixture.persisted("ui"), persisted_before);
        assert_eq!(fixture.persisted("ui-overrides"), None);
        assert_eq!(store.validation_errors(), Some(violations));
    }

    #[test]
    fn test_update_through_scalar_is_violation() {
        let fixture = Fixture::new();
        let store = fixture.store::<UiSettings>();
        let before = store.settings();

        let err = store
            .update_settings("header.height.value", json!(10))
            .unwrap_err();

        let Error::SchemaViolation(violations) = err else {
            panic!("expected schema violation");
        };
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "header.height");
        assert_eq!(store.settings(), before);
    }

    #[test]
    fn test_update_malformed_path() {
        let fixture = Fixture::new();
        let store = fixture.store::<UiSettings>();
        let err = store.update_settings("theme..dark", json!(true)).unwrap_err();
        assert!(matches!(err, Error::SchemaViolation(_)));
    }

    #[test]
    fn test_successful_update_clears_errors() {
        let fixture = Fixture::new();
        let store = fixture.store::<UiSettings>();
        let _ = store.update_settings("theme.dark", json!("yes"));
        assert!(!store.is_valid());

        store.update_settings("theme.dark", json!(true)).unwrap();
        assert!(store.is_valid());
        assert_eq!(store.validation_errors(), None);
    }

    #[test]
    fn test_get_absent_and_malformed() {
        let fixture = Fixture::new();
        let store = fixture.store::<UiSettings>();
        assert_eq!(store.get("theme.missing"), None);
        assert_eq!(store.get("theme.dark.deeper"), None);
        assert_eq!(store.get(""), None);
        assert_eq!(store.get("core..pwa"), None);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let fixture = Fixture::new();
        let store = fixture.store::<UiSettings>();
        store.update_settings("theme.dark", json!(true)).unwrap();

        assert!(store.reset().is_committed());
        assert_eq!(store.settings(), UiSettings::defaults());
        assert_eq!(fixture.persisted("ui"), Some(UiSettings::defaults()));
        assert_eq!(fixture.persisted("ui-overrides"), Some(json!({})));

        store.initialize();
        assert_eq!(store.get("theme.dark"), Some(json!(false)));
    }

    #[test]
    fn test_listeners_notified_on_commit_only() {
        let fixture = Fixture::new();
        let store = fixture.store::<UiSettings>();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let subscription = store.subscribe(Arc::new(move |domain, settings| {
            assert_eq!(domain, Domain::Ui);
            assert!(settings.is_object());
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        store.update_settings("theme.dark", json!(true)).unwrap();
        let _ = store.update_settings("theme.dark", json!(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(subscription.unsubscribe());
        store.update_settings("theme.dark", json!(false)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_can_read_store() {
        let fixture = Fixture::new();
        let store = Arc::new(fixture.store::<UiSettings>());
        let seen = Arc::new(Mutex::new(None));

        let reader = Arc::downgrade(&store);
        let sink = Arc::clone(&seen);
        store.subscribe(Arc::new(move |_, _| {
            if let Some(store) = reader.upgrade() {
                *sink.lock().unwrap() = store.get("theme.dark");
            }
        }));

        store.update_settings("theme.dark", json!(true)).unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(json!(true)));
    }

    #[test]
    fn test_stores_share_compiled_validator() {
        let fixture = Fixture::new();
        let _a = fixture.store::<UiSettings>();
        let _b = fixture.store::<UiSettings>();
        let _c = fixture.store::<UserSettings>();
        assert_eq!(fixture.validators.len(), 2);
    }
}
