//! Localization catalogs.
//!
//! The core never renders text. It only assembles message trees per
//! language (built-ins, overlaid by whatever the server sent) and hands
//! them to a [`LocalizationSink`].

use crate::tree::{self, deep_merge};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// Language used when nothing else is configured.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Messages compiled into the binary, keyed by language tag.
pub fn builtin_messages() -> BTreeMap<String, Value> {
    let mut messages = BTreeMap::new();
    messages.insert(
        DEFAULT_LANGUAGE.to_string(),
        json!({
            "app": {
                "name": "Settle",
                "loading": "Loading...",
                "offline": "Working offline with the last synced settings"
            },
            "settings": {
                "saved": "Settings saved",
                "invalid": "Settings were rejected",
                "reset": "Settings restored to defaults"
            },
            "errors": {
                "network": "Could not reach the settings server",
                "unknown": "Something went wrong"
            }
        }),
    );
    messages
}

/// Message trees for every known language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    languages: BTreeMap<String, Value>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The compiled-in catalog.
    pub fn builtin() -> Self {
        Self {
            languages: builtin_messages(),
        }
    }

    /// Rebuild a catalog from its persisted JSON form.
    ///
    /// Entries that are not objects are dropped.
    pub fn from_value(value: &Value) -> Self {
        let languages = value
            .as_object()
            .map(|map| {
                map.iter()
                    .filter(|(_, messages)| messages.is_object())
                    .map(|(lang, messages)| (lang.clone(), messages.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Self { languages }
    }

    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .languages
            .iter()
            .map(|(lang, messages)| (lang.clone(), messages.clone()))
            .collect();
        Value::Object(map)
    }

    pub fn get(&self, language: &str) -> Option<&Value> {
        self.languages.get(language)
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.languages.iter().map(|(lang, messages)| (lang.as_str(), messages))
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    /// Deep-merge `messages` over the existing entry for `language`.
    pub fn merge(&mut self, language: &str, messages: &Value) {
        if !messages.is_object() {
            return;
        }
        let merged = match self.languages.get(language) {
            Some(existing) => deep_merge(&[existing, messages]),
            None => deep_merge(&[&tree::empty(), messages]),
        };
        self.languages.insert(language.to_string(), merged);
    }

    /// Deep-merge every language of `other` over this catalog.
    pub fn merge_catalog(&mut self, other: &Catalog) {
        for (language, messages) in other.iter() {
            self.merge(language, messages);
        }
    }

    /// Push every language to `sink`.
    pub fn publish(&self, sink: &dyn LocalizationSink) {
        for (language, messages) in self.iter() {
            sink.set_catalog(language, messages);
        }
    }
}

/// Receiver of merged message catalogs.
pub trait LocalizationSink: Send + Sync {
    fn set_catalog(&self, language: &str, messages: &Value);
}

/// Keeps the last catalog set for each language.
#[derive(Debug, Default)]
pub struct MemoryCatalogSink {
    catalogs: Mutex<BTreeMap<String, Value>>,
}

impl MemoryCatalogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, language: &str) -> Option<Value> {
        self.catalogs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(language)
            .cloned()
    }

    pub fn languages(&self) -> Vec<String> {
        self.catalogs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl LocalizationSink for MemoryCatalogSink {
    fn set_catalog(&self, language: &str, messages: &Value) {
        self.catalogs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(language.to_string(), messages.clone());
    }
}
