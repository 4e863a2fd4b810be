//! Key-value persistence for settings trees.
//!
//! The store layer only needs `get`/`set` of JSON text keyed by a short
//! name (the domain name, `i18n`, `sync`). Two implementations are provided:
//!
//! - [`FileStore`] - one `<key>.json` file per key inside a data directory
//! - [`MemoryStore`] - an in-process map for tests and embedders

use crate::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Synchronous, local key-value surface owned by the host environment.
pub trait Persistence: Send + Sync {
    /// Read the JSON text stored under `key`. Missing keys yield `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `json` under `key`, replacing any previous value.
    fn set(&self, key: &str, json: &str) -> Result<()>;

    /// Where the data lives (for display purposes).
    fn location(&self) -> String;
}

fn check_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("invalid persistence key '{}'", key)))
    }
}

/// File-backed persistence: `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` as the data directory. It is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Persistence for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        check_key(key)?;
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, json: &str) -> Result<()> {
        check_key(key)?;
        fs::create_dir_all(&self.dir)?;
        // Write-then-rename so readers never see a half-written file
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, self.path_for(key))?;
        Ok(())
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}

/// In-memory persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry, e.g. to simulate a previous session.
    pub fn with_entry(self, key: &str, json: &str) -> Self {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), json.to_string());
        self
    }

    /// Raw text under `key`, bypassing key validation.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl Persistence for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        check_key(key)?;
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, json: &str) -> Result<()> {
        check_key(key)?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), json.to_string());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
