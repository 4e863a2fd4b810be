//! The store registry: one validated store per domain.
//!
//! The registry is constructed once at startup and passed by reference to
//! whatever needs domain state. It owns the compiled validator cache and the
//! shared persistence and diagnostics handles.

use crate::diagnostics::Diagnostics;
use crate::domains::{AppSettings, AssetSettings, Domain, UiSettings, UserSettings};
use crate::persistence::Persistence;
use crate::schema::ValidatorCache;
use crate::store::{InitOutcome, SettingsStore, ValidatedStore};
use crate::Result;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Owner of every domain store.
pub struct StoreRegistry {
    ui: ValidatedStore<UiSettings>,
    app: ValidatedStore<AppSettings>,
    user: ValidatedStore<UserSettings>,
    asset: ValidatedStore<AssetSettings>,
    validators: ValidatorCache,
    persistence: Arc<dyn Persistence>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("ui", &self.ui)
            .field("app", &self.app)
            .field("user", &self.user)
            .field("asset", &self.asset)
            .field("persistence", &self.persistence.location())
            .finish()
    }
}

impl StoreRegistry {
    /// Build unloaded stores for every domain.
    ///
    /// Fails only if a domain schema does not compile, which is an
    /// authoring error.
    pub fn new(
        persistence: Arc<dyn Persistence>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self> {
        let validators = ValidatorCache::new();
        Ok(Self {
            ui: ValidatedStore::new(&validators, persistence.clone(), diagnostics.clone())?,
            app: ValidatedStore::new(&validators, persistence.clone(), diagnostics.clone())?,
            user: ValidatedStore::new(&validators, persistence.clone(), diagnostics.clone())?,
            asset: ValidatedStore::new(&validators, persistence.clone(), diagnostics.clone())?,
            validators,
            persistence,
            diagnostics,
        })
    }

    pub fn ui(&self) -> &ValidatedStore<UiSettings> {
        &self.ui
    }

    pub fn app(&self) -> &ValidatedStore<AppSettings> {
        &self.app
    }

    pub fn user(&self) -> &ValidatedStore<UserSettings> {
        &self.user
    }

    pub fn asset(&self) -> &ValidatedStore<AssetSettings> {
        &self.asset
    }

    /// Look up a store by domain.
    pub fn get(&self, domain: Domain) -> &dyn SettingsStore {
        match domain {
            Domain::Ui => &self.ui,
            Domain::App => &self.app,
            Domain::User => &self.user,
            Domain::Asset => &self.asset,
        }
    }

    /// All stores in initialization order.
    pub fn stores(&self) -> impl Iterator<Item = &dyn SettingsStore> {
        Domain::ALL.into_iter().map(|domain| self.get(domain))
    }

    /// Bootstrap every store from defaults and persisted settings.
    pub fn initialize_all(&self) -> BTreeMap<Domain, InitOutcome> {
        self.stores()
            .map(|store| (store.domain(), store.initialize()))
            .collect()
    }

    /// Current settings of every domain as one document keyed by domain name.
    pub fn snapshot(&self) -> Value {
        let mut all = Map::new();
        for store in self.stores() {
            all.insert(store.domain().to_string(), store.settings());
        }
        Value::Object(all)
    }

    pub fn validators(&self) -> &ValidatorCache {
        &self.validators
    }

    pub fn persistence(&self) -> &Arc<dyn Persistence> {
        &self.persistence
    }

    pub fn diagnostics(&self) -> &Arc<dyn Diagnostics> {
        &self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingDiagnostics;
    use crate::persistence::MemoryStore;
    use serde_json::json;

    fn registry() -> StoreRegistry {
        StoreRegistry::new(
            Arc::new(MemoryStore::new()),
            Arc::new(RecordingDiagnostics::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_by_domain() {
        let registry = registry();
        for domain in Domain::ALL {
            assert_eq!(registry.get(domain).domain(), domain);
        }
        assert_eq!(registry.validators().len(), 4);
    }

    #[test]
    fn test_initialize_all() {
        let registry = registry();
        let outcomes = registry.initialize_all();
        assert_eq!(outcomes.len(), 4);
        assert!(outcomes.values().all(InitOutcome::is_committed));
        assert!(registry.stores().all(|store| store.is_loaded()));
    }

    #[test]
    fn test_snapshot_keyed_by_domain() {
        let registry = registry();
        registry.ui().update_settings("theme.dark", json!(true)).unwrap();
        let snapshot = registry.snapshot();
        assert_eq!(snapshot["ui"]["theme"]["dark"], json!(true));
        assert_eq!(snapshot["user"]["profile"]["id"], json!("default"));
        assert_eq!(snapshot.as_object().unwrap().len(), 4);
    }
}
