//! Command implementations for the settle CLI.
//!
//! Every command opens the settings stores in a data directory, bootstraps
//! them from defaults and persisted files, and returns a result type that
//! renders as JSON or as human-readable text.

use crate::config::{
    self, CONFIG_KEYS, ConfigOverrides, OutputFormat, SettleConfig, ValueSource,
};
use crate::diagnostics::TracingDiagnostics;
use crate::domains::Domain;
use crate::features::{FeatureState, feature_state};
use crate::initializer::{AppInitializer, InitReport, SyncRecord, last_sync};
use crate::persistence::FileStore;
use crate::registry::StoreRegistry;
use crate::remote::HttpRemote;
use crate::schema::{Violation, summarize};
use crate::store::InitOutcome;
use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json_line<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Open the stores persisted under `data_dir` and bootstrap them.
pub fn open_registry(data_dir: &Path) -> Result<StoreRegistry> {
    let persistence = Arc::new(FileStore::new(data_dir));
    let registry = StoreRegistry::new(persistence, Arc::new(TracingDiagnostics))?;
    registry.initialize_all();
    Ok(registry)
}

/// Whether config.kdl asks for human-readable output.
///
/// An unreadable config counts as "no preference".
pub fn prefers_human(data_dir: &Path) -> bool {
    SettleConfig::load(&config::config_path(data_dir))
        .map(|config| config.output_format == Some(OutputFormat::Human))
        .unwrap_or(false)
}

/// Parse a CLI value as JSON, falling back to a plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

// === show ===

#[derive(Debug, Serialize)]
pub struct ShowResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub found: bool,
    pub value: Value,
}

impl Output for ShowResult {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        if !self.found {
            let domain = self.domain.map(|d| d.as_str()).unwrap_or("?");
            let path = self.path.as_deref().unwrap_or("");
            return format!("No value at {}.{}", domain, path);
        }
        pretty(&self.value)
    }
}

/// Print a whole domain, a value inside it, or every domain.
pub fn show(data_dir: &Path, domain: Option<Domain>, path: Option<&str>) -> Result<ShowResult> {
    let registry = open_registry(data_dir)?;

    let Some(domain) = domain else {
        if path.is_some() {
            return Err(Error::InvalidInput("--path requires a domain".to_string()));
        }
        return Ok(ShowResult {
            domain: None,
            path: None,
            found: true,
            value: registry.snapshot(),
        });
    };

    let store = registry.get(domain);
    let value = match path {
        Some(path) => store.get(path),
        None => Some(store.settings()),
    };
    Ok(ShowResult {
        domain: Some(domain),
        path: path.map(str::to_string),
        found: value.is_some(),
        value: value.unwrap_or(Value::Null),
    })
}

// === set ===

#[derive(Debug, Serialize)]
pub struct SetResult {
    pub domain: Domain,
    pub path: String,
    pub value: Value,
}

impl Output for SetResult {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        format!("Set {}.{} = {}", self.domain, self.path, self.value)
    }
}

/// Update one value; rejected candidates leave the stored settings untouched.
pub fn set(data_dir: &Path, domain: Domain, path: &str, raw_value: &str) -> Result<SetResult> {
    let registry = open_registry(data_dir)?;
    let value = parse_value(raw_value);
    registry.get(domain).update_settings(path, value.clone())?;
    Ok(SetResult {
        domain,
        path: path.to_string(),
        value,
    })
}

// === reset ===

#[derive(Debug, Serialize)]
pub struct ResetResult {
    pub domain: Domain,
    pub outcome: InitOutcome,
}

impl Output for ResetResult {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        match &self.outcome {
            InitOutcome::Committed => format!("Reset {} settings to defaults.", self.domain),
            InitOutcome::Rejected(violations) => format!(
                "Defaults for {} were rejected: {}",
                self.domain,
                summarize(violations)
            ),
        }
    }
}

pub fn reset(data_dir: &Path, domain: Domain) -> Result<ResetResult> {
    let registry = open_registry(data_dir)?;
    let outcome = registry.get(domain).reset();
    Ok(ResetResult { domain, outcome })
}

// === validate ===

#[derive(Debug, Serialize)]
pub struct DomainValidity {
    pub domain: Domain,
    pub valid: bool,
    pub violations: Vec<Violation>,
}

#[derive(Debug, Serialize)]
pub struct ValidateResult {
    pub valid: bool,
    pub domains: Vec<DomainValidity>,
}

impl Output for ValidateResult {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for entry in &self.domains {
            if entry.valid {
                lines.push(format!("{}: ok", entry.domain));
            } else {
                lines.push(format!("{}: {} violation(s)", entry.domain, entry.violations.len()));
                for violation in &entry.violations {
                    lines.push(format!("  - {}", violation));
                }
            }
        }
        lines.join("\n")
    }
}

/// Check every domain's persisted settings against its schema.
pub fn validate(data_dir: &Path) -> Result<ValidateResult> {
    let registry = open_registry(data_dir)?;
    let domains: Vec<DomainValidity> = registry
        .stores()
        .map(|store| DomainValidity {
            domain: store.domain(),
            valid: store.is_valid(),
            violations: store.validation_errors().unwrap_or_default(),
        })
        .collect();
    Ok(ValidateResult {
        valid: domains.iter().all(|d| d.valid),
        domains,
    })
}

// === feature ===

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct FeatureResult {
    pub state: FeatureState,
}

impl Output for FeatureResult {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        use crate::features::FeatureReason;
        let detail = match &self.state.reason {
            FeatureReason::NotFound => "no such feature".to_string(),
            FeatureReason::Required => "required".to_string(),
            FeatureReason::Enabled => "enabled".to_string(),
            FeatureReason::Disabled => "disabled".to_string(),
            FeatureReason::DependencyDisabled(dep) => format!("dependency {} is off", dep),
            FeatureReason::DependencyCycle(at) => format!("dependency cycle at {}", at),
        };
        let status = if self.state.enabled { "on" } else { "off" };
        format!("{}: {} ({})", self.state.path, status, detail)
    }
}

pub fn feature(data_dir: &Path, path: &str) -> Result<FeatureResult> {
    let registry = open_registry(data_dir)?;
    Ok(FeatureResult {
        state: feature_state(registry.app(), path),
    })
}

// === sync ===

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub server_url: String,
    #[serde(flatten)]
    pub report: InitReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<SyncRecord>,
}

impl Output for SyncResult {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        let report = &self.report;
        let mut lines = Vec::new();
        if report.synced {
            lines.push(format!(
                "Synced {} ({}) from {}",
                report.app_id, report.language, self.server_url
            ));
            if let Some(ref version) = report.version {
                lines.push(format!("  version: {}", version));
            }
            for (domain, outcome) in &report.applied {
                match outcome {
                    InitOutcome::Committed => lines.push(format!("  {}: applied", domain)),
                    InitOutcome::Rejected(violations) => lines.push(format!(
                        "  {}: rejected ({})",
                        domain,
                        summarize(violations)
                    )),
                }
            }
        } else {
            lines.push(format!(
                "Could not sync from {}: {}",
                self.server_url,
                report.error.as_deref().unwrap_or("unknown error")
            ));
            match &self.last_sync {
                Some(record) => lines.push(format!(
                    "  using settings from last sync at {}",
                    record.synced_at.to_rfc3339()
                )),
                None => lines.push("  using local settings".to_string()),
            }
        }
        lines.join("\n")
    }
}

/// Run the full startup sequence against the configured server.
///
/// A failed fetch is not an error: the report says what happened.
pub fn sync(data_dir: &Path, overrides: &ConfigOverrides) -> Result<SyncResult> {
    let resolved = config::resolve_config(data_dir, overrides)?;
    let persistence = Arc::new(FileStore::new(data_dir));
    let registry = StoreRegistry::new(persistence.clone(), Arc::new(TracingDiagnostics))?;
    let remote = HttpRemote::new(resolved.server_url())
        .with_timeout(Duration::from_millis(resolved.timeout_ms()));

    let report = AppInitializer::new(&registry, &remote)
        .app_id(resolved.app_id())
        .language(resolved.language())
        .run();

    Ok(SyncResult {
        server_url: remote.base_url().to_string(),
        last_sync: last_sync(persistence.as_ref()),
        report,
    })
}

// === config ===

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: ValueSource,
}

#[derive(Debug, Serialize)]
pub struct ConfigListResult {
    pub entries: Vec<ConfigEntry>,
}

impl Output for ConfigListResult {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{} = {} ({})", e.key, e.value, e.source))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Output for ConfigEntry {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        format!("{} = {} ({})", self.key, self.value, self.source)
    }
}

fn resolved_entries(data_dir: &Path) -> Result<Vec<ConfigEntry>> {
    let resolved = config::resolve_config(data_dir, &ConfigOverrides::new())?;
    Ok(resolved
        .entries()
        .into_iter()
        .map(|(key, value, source)| ConfigEntry {
            key: key.to_string(),
            value,
            source: source.clone(),
        })
        .collect())
}

/// Every config key with its effective value and source.
pub fn config_list(data_dir: &Path) -> Result<ConfigListResult> {
    Ok(ConfigListResult {
        entries: resolved_entries(data_dir)?,
    })
}

/// The effective value of one config key.
pub fn config_get(data_dir: &Path, key: &str) -> Result<ConfigEntry> {
    resolved_entries(data_dir)?
        .into_iter()
        .find(|entry| entry.key == key)
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "unknown config key '{}' (expected one of: {})",
                key,
                CONFIG_KEYS.join(", ")
            ))
        })
}

#[derive(Debug, Serialize)]
pub struct ConfigSetResult {
    pub key: String,
    pub value: String,
    pub path: String,
}

impl Output for ConfigSetResult {
    fn to_json(&self) -> String {
        json_line(self)
    }

    fn to_human(&self) -> String {
        format!("Set {} = {} in {}", self.key, self.value, self.path)
    }
}

/// Write one key to config.kdl.
pub fn config_set(data_dir: &Path, key: &str, value: &str) -> Result<ConfigSetResult> {
    let path = config::config_path(data_dir);
    let mut file = SettleConfig::load(&path)?;
    file.set(key, value)?;
    file.save(&path)?;
    Ok(ConfigSetResult {
        key: key.to_string(),
        value: file.get(key)?.unwrap_or_default(),
        path: path.display().to_string(),
    })
}
