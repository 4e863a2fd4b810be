//! Remote settings source.
//!
//! The server returns one consolidated document per application and
//! language:
//!
//! ```json
//! {
//!   "settings": { "ui": { "theme": { "dark": true } }, "app": { ... } },
//!   "translations": [ { "languageTag": "en-US", "messages": { ... } } ],
//!   "version": "2.0.0",
//!   "updatedAt": "2026-10-18T12:00:00Z"
//! }
//! ```
//!
//! Older servers deliver translations as an `i18n` map keyed by language
//! tag instead; both shapes are accepted.

use crate::domains::Domain;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Default timeout for the remote call (milliseconds).
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// User-Agent header sent with remote requests.
const USER_AGENT: &str = concat!("settle/", env!("CARGO_PKG_VERSION"));

/// Localization entries for one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub language_tag: String,
    pub messages: Value,
}

/// The consolidated remote configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDocument {
    /// Partial settings trees keyed by domain name
    pub settings: Map<String, Value>,
    #[serde(default)]
    pub translations: Vec<Translation>,
    /// Legacy map form of `translations`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i18n: Option<Map<String, Value>>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RemoteDocument {
    /// Parse and check a document from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let document: RemoteDocument = serde_json::from_str(text)
            .map_err(|e| Error::RemoteUnavailable(format!("malformed payload: {}", e)))?;
        document.check()?;
        Ok(document)
    }

    /// Reject payloads whose per-domain settings are not objects.
    pub fn check(&self) -> Result<()> {
        for (name, value) in &self.settings {
            if Domain::parse(name).is_some() && !value.is_object() {
                return Err(Error::RemoteUnavailable(format!(
                    "malformed payload: settings.{} is not an object",
                    name
                )));
            }
        }
        Ok(())
    }

    /// The partial tree for `domain`, if the server sent one.
    pub fn settings_for(&self, domain: Domain) -> Option<&Value> {
        self.settings.get(domain.as_str())
    }

    /// Keys under `settings` that do not name a known domain.
    pub fn unknown_domains(&self) -> Vec<&str> {
        self.settings
            .keys()
            .filter(|name| Domain::parse(name).is_none())
            .map(String::as_str)
            .collect()
    }

    /// All message trees delivered for `language`, in payload order.
    pub fn messages_for(&self, language: &str) -> Vec<&Value> {
        let mut found: Vec<&Value> = self
            .translations
            .iter()
            .filter(|t| t.language_tag == language)
            .map(|t| &t.messages)
            .collect();
        if let Some(messages) = self.i18n.as_ref().and_then(|map| map.get(language)) {
            found.push(messages);
        }
        found
    }
}

/// A source of remote settings.
pub trait RemoteSource {
    /// Fetch the consolidated document for `app_id` in `language`.
    ///
    /// Every failure (network, timeout, non-2xx, malformed payload) maps to
    /// [`Error::RemoteUnavailable`].
    fn fetch(&self, app_id: &str, language: &str) -> Result<RemoteDocument>;
}

/// Blocking HTTP source: `GET {base_url}/api/apps/{app_id}?lang={language}`.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    base_url: String,
    timeout: Duration,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL requested for `app_id` (language is sent as a query parameter).
    pub fn url_for(&self, app_id: &str) -> String {
        format!("{}/api/apps/{}", self.base_url, app_id)
    }
}

impl RemoteSource for HttpRemote {
    fn fetch(&self, app_id: &str, language: &str) -> Result<RemoteDocument> {
        let url = self.url_for(app_id);
        tracing::debug!(url = %url, language, "fetching remote settings");

        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let response = agent
            .get(&url)
            .query("lang", language)
            .set("Accept", "application/json")
            .set("User-Agent", USER_AGENT)
            .call();

        match response {
            Ok(resp) => {
                let body = resp
                    .into_string()
                    .map_err(|e| Error::RemoteUnavailable(format!("failed to read body: {}", e)))?;
                RemoteDocument::from_json(&body)
            }
            Err(ureq::Error::Status(code, _)) => Err(Error::RemoteUnavailable(format!(
                "{} returned HTTP {}",
                url, code
            ))),
            Err(e) => Err(Error::RemoteUnavailable(e.to_string())),
        }
    }
}

/// Serves a fixed document, or fails every call when constructed with
/// [`StaticRemote::unavailable`]. Records each request.
#[derive(Debug, Default)]
pub struct StaticRemote {
    document: Option<RemoteDocument>,
    requests: Mutex<Vec<(String, String)>>,
}

impl StaticRemote {
    pub fn new(document: RemoteDocument) -> Self {
        Self {
            document: Some(document),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Build from a JSON payload, as the server would send it.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(Self::new(RemoteDocument::from_json(text)?))
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    /// `(app_id, language)` pairs requested so far.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RemoteSource for StaticRemote {
    fn fetch(&self, app_id: &str, language: &str) -> Result<RemoteDocument> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((app_id.to_string(), language.to_string()));
        self.document
            .clone()
            .ok_or_else(|| Error::RemoteUnavailable("remote source is offline".to_string()))
    }
}
