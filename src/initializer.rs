//! Application startup: local bootstrap, then one remote sync.
//!
//! 1. Every store is initialized from defaults and persisted settings, so
//!    usable state exists before any network traffic.
//! 2. One consolidated document is fetched for the configured app id and
//!    language. Each domain's partial tree is fed back through
//!    `initialize_with_settings`, and the document's messages for the
//!    language are merged over the built-in catalog.
//! 3. If the fetch fails, stores keep their bootstrap state and the
//!    catalog falls back to built-ins plus the last persisted catalog. The
//!    failure goes to diagnostics; nothing is returned as an error.
//! 4. After a successful sync the catalog and a sync record are persisted
//!    (stores persist their own trees on commit), so the next offline
//!    bootstrap reflects this sync.

use crate::domains::Domain;
use crate::i18n::{Catalog, DEFAULT_LANGUAGE, LocalizationSink};
use crate::persistence::Persistence;
use crate::registry::StoreRegistry;
use crate::remote::{RemoteDocument, RemoteSource};
use crate::store::InitOutcome;
use crate::tree;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persistence key of the merged localization catalog.
pub const CATALOG_KEY: &str = "i18n";

/// Persistence key of the last successful sync record.
pub const SYNC_KEY: &str = "sync";

/// Application identifier used when none is configured.
pub const DEFAULT_APP_ID: &str = "default";

/// Metadata about the last successful sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRecord {
    pub app_id: String,
    pub language: String,
    pub version: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub synced_at: DateTime<Utc>,
}

/// Read the last sync record, if one was persisted and parses.
pub fn last_sync(persistence: &dyn Persistence) -> Option<SyncRecord> {
    let text = persistence.get(SYNC_KEY).ok().flatten()?;
    serde_json::from_str(&text).ok()
}

/// Built-in messages overlaid with the persisted catalog.
///
/// An unreadable persisted catalog is ignored.
pub fn offline_catalog(persistence: &dyn Persistence) -> Catalog {
    let mut catalog = Catalog::builtin();
    let persisted = persistence
        .get(CATALOG_KEY)
        .ok()
        .flatten()
        .and_then(|text| serde_json::from_str(&text).ok());
    if let Some(value) = persisted {
        catalog.merge_catalog(&Catalog::from_value(&value));
    }
    catalog
}

/// What a startup run did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitReport {
    pub app_id: String,
    pub language: String,
    /// True when the remote document was fetched and applied
    pub synced: bool,
    /// Why the sync was skipped, when it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub version: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Per-domain outcome of the local bootstrap
    pub bootstrap: BTreeMap<Domain, InitOutcome>,
    /// Per-domain outcome of applying the remote document
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub applied: BTreeMap<Domain, InitOutcome>,
    /// The catalog handed to the localization sink
    pub catalog: Catalog,
}

impl InitReport {
    /// Domains whose remote settings were rejected.
    pub fn rejected(&self) -> Vec<Domain> {
        self.applied
            .iter()
            .filter(|(_, outcome)| !outcome.is_committed())
            .map(|(domain, _)| *domain)
            .collect()
    }
}

/// Drives startup against a registry and a remote source.
pub struct AppInitializer<'a> {
    registry: &'a StoreRegistry,
    remote: &'a dyn RemoteSource,
    sink: Option<&'a dyn LocalizationSink>,
    app_id: String,
    language: String,
}

impl<'a> AppInitializer<'a> {
    pub fn new(registry: &'a StoreRegistry, remote: &'a dyn RemoteSource) -> Self {
        Self {
            registry,
            remote,
            sink: None,
            app_id: DEFAULT_APP_ID.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Publish the final catalog to `sink`, one call per language.
    pub fn sink(mut self, sink: &'a dyn LocalizationSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Run the full startup sequence. Never fails.
    pub fn run(&self) -> InitReport {
        let bootstrap = self.registry.initialize_all();
        tracing::debug!(app_id = %self.app_id, language = %self.language, "bootstrap complete");

        let mut report = InitReport {
            app_id: self.app_id.clone(),
            language: self.language.clone(),
            synced: false,
            error: None,
            version: None,
            updated_at: None,
            bootstrap,
            applied: BTreeMap::new(),
            catalog: Catalog::new(),
        };

        match self.remote.fetch(&self.app_id, &self.language) {
            Ok(document) => {
                self.apply(&document, &mut report);
            }
            Err(e) => {
                self.registry.diagnostics().warn(&format!(
                    "Could not reach server for settings updates: {}",
                    e
                ));
                report.error = Some(e.to_string());
                report.catalog = offline_catalog(self.registry.persistence().as_ref());
            }
        }

        if let Some(sink) = self.sink {
            report.catalog.publish(sink);
        }
        report
    }

    fn apply(&self, document: &RemoteDocument, report: &mut InitReport) {
        for name in document.unknown_domains() {
            self.registry
                .diagnostics()
                .warn(&format!("ignoring settings for unknown domain '{}'", name));
        }

        let empty = tree::empty();
        for store in self.registry.stores() {
            let partial = document.settings_for(store.domain()).unwrap_or(&empty);
            let outcome = store.initialize_with_settings(partial);
            report.applied.insert(store.domain(), outcome);
        }

        let mut catalog = Catalog::builtin();
        for messages in document.messages_for(&self.language) {
            catalog.merge(&self.language, messages);
        }

        let record = SyncRecord {
            app_id: self.app_id.clone(),
            language: self.language.clone(),
            version: document.version.clone(),
            updated_at: document.updated_at,
            synced_at: Utc::now(),
        };
        self.persist(&catalog, &record);
        tracing::debug!(
            version = record.version.as_deref().unwrap_or("-"),
            synced_at = %record.synced_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            "remote settings applied"
        );

        report.synced = true;
        report.version = record.version;
        report.updated_at = record.updated_at;
        report.catalog = catalog;
    }

    fn persist(&self, catalog: &Catalog, record: &SyncRecord) {
        let persistence = self.registry.persistence();
        let written = serde_json::to_string_pretty(&catalog.to_value())
            .map_err(crate::Error::from)
            .and_then(|json| persistence.set(CATALOG_KEY, &json))
            .and_then(|()| {
                let json = serde_json::to_string_pretty(record)?;
                persistence.set(SYNC_KEY, &json)
            });
        if let Err(e) = written {
            self.registry
                .diagnostics()
                .error(&format!("failed to persist sync results: {}", e));
        }
    }
}
