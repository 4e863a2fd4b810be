//! KDL schema for config.kdl.
//!
//! This module provides:
//! - The `SettleConfig` struct mirroring the file
//! - Conversion to/from KDL documents
//! - Validation and key-based access used by `settle config get/set`

use crate::{Error, Result};
use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the tool configuration inside the data directory.
pub const CONFIG_FILE: &str = "config.kdl";

/// Bounds for `timeout-ms`.
pub const MIN_TIMEOUT_MS: u64 = 1;
pub const MAX_TIMEOUT_MS: u64 = 120_000;

/// Keys accepted in config.kdl, in file order.
pub const CONFIG_KEYS: [&str; 5] = [
    "app-id",
    "language",
    "server-url",
    "timeout-ms",
    "output-format",
];

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tool preferences stored in config.kdl.
///
/// # KDL Schema
///
/// ```kdl
/// app-id "default"
/// language "en-US"
/// server-url "http://localhost:3000"
/// timeout-ms 10000
/// output-format "json"  // or "human"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleConfig {
    /// Application identifier sent to the settings server
    pub app_id: Option<String>,

    /// Language tag for localization (e.g. "en-US")
    pub language: Option<String>,

    /// Base URL of the settings server
    pub server_url: Option<String>,

    /// Remote fetch timeout in milliseconds
    pub timeout_ms: Option<u64>,

    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,
}

impl SettleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(timeout) = self.timeout_ms {
            if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&timeout) {
                return Err(format!(
                    "timeout-ms must be {}-{}, got {}",
                    MIN_TIMEOUT_MS, MAX_TIMEOUT_MS, timeout
                ));
            }
        }
        if let Some(ref url) = self.server_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("server-url must start with http:// or https://, got {}", url));
            }
        }
        for (key, value) in [("app-id", &self.app_id), ("language", &self.language)] {
            if value.as_deref() == Some("") {
                return Err(format!("{} must not be empty", key));
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document.
    ///
    /// Unknown nodes and values of the wrong type are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        config.app_id = string_value(doc, "app-id");
        config.language = string_value(doc, "language");
        config.server_url = string_value(doc, "server-url");
        config.output_format =
            string_value(doc, "output-format").and_then(|s| OutputFormat::parse(&s));

        // Parse timeout-ms
        if let Some(node) = doc.get("timeout-ms") {
            if let Some(entry) = node.entries().first() {
                if let Some(i) = entry.value().as_integer() {
                    if (MIN_TIMEOUT_MS as i128..=MAX_TIMEOUT_MS as i128).contains(&i) {
                        config.timeout_ms = Some(i as u64);
                    }
                }
            }
        }

        config
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        let strings = [
            ("app-id", self.app_id.clone()),
            ("language", self.language.clone()),
            ("server-url", self.server_url.clone()),
        ];
        for (name, value) in strings {
            if let Some(value) = value {
                let mut node = KdlNode::new(name);
                node.push(KdlEntry::new(KdlValue::String(value)));
                doc.nodes_mut().push(node);
            }
        }

        if let Some(timeout) = self.timeout_ms {
            let mut node = KdlNode::new("timeout-ms");
            node.push(KdlEntry::new(KdlValue::Integer(timeout as i128)));
            doc.nodes_mut().push(node);
        }

        if let Some(format) = self.output_format {
            let mut node = KdlNode::new("output-format");
            node.push(KdlEntry::new(KdlValue::String(format.as_str().to_string())));
            doc.nodes_mut().push(node);
        }

        doc
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &SettleConfig) {
        if other.app_id.is_some() {
            self.app_id = other.app_id.clone();
        }
        if other.language.is_some() {
            self.language = other.language.clone();
        }
        if other.server_url.is_some() {
            self.server_url = other.server_url.clone();
        }
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
        if other.output_format.is_some() {
            self.output_format = other.output_format;
        }
    }

    /// The value of `key` as a display string, if set.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "app-id" => self.app_id.clone(),
            "language" => self.language.clone(),
            "server-url" => self.server_url.clone(),
            "timeout-ms" => self.timeout_ms.map(|t| t.to_string()),
            "output-format" => self.output_format.map(|f| f.as_str().to_string()),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Set `key` from its string form, validating the result.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        match key {
            "app-id" => updated.app_id = Some(value.to_string()),
            "language" => updated.language = Some(value.to_string()),
            "server-url" => updated.server_url = Some(value.trim_end_matches('/').to_string()),
            "timeout-ms" => {
                let timeout = value.parse::<u64>().map_err(|_| {
                    Error::InvalidInput(format!("timeout-ms must be an integer, got {}", value))
                })?;
                updated.timeout_ms = Some(timeout);
            }
            "output-format" => {
                let format = OutputFormat::parse(value).ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "output-format must be 'json' or 'human', got {}",
                        value
                    ))
                })?;
                updated.output_format = Some(format);
            }
            _ => return Err(unknown_key(key)),
        }
        updated.validate().map_err(Error::InvalidInput)?;
        *self = updated;
        Ok(())
    }

    /// Load config.kdl from `path`; a missing file yields an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)?;
        let doc: KdlDocument = content
            .parse()
            .map_err(|e| Error::Kdl(format!("Failed to parse KDL in {}: {}", path.display(), e)))?;
        Ok(Self::from_kdl(&doc))
    }

    /// Write config.kdl to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_kdl().to_string())?;
        Ok(())
    }
}

fn string_value(doc: &KdlDocument, name: &str) -> Option<String> {
    let node = doc.get(name)?;
    let entry = node.entries().first()?;
    entry.value().as_string().map(str::to_string)
}

fn unknown_key(key: &str) -> Error {
    Error::InvalidInput(format!(
        "unknown config key '{}' (expected one of: {})",
        key,
        CONFIG_KEYS.join(", ")
    ))
}
