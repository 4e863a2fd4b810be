//! Precedence resolution for tool configuration.
//!
//! ## Config Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`SETTLE_APP_ID`, `SETTLE_LANGUAGE`, `SETTLE_SERVER_URL`)
//! 3. `config.kdl` in the data directory
//! 4. Built-in defaults
//!
//! ## Data Directory Precedence
//!
//! 1. `--data-dir`
//! 2. `SETTLE_DATA_DIR`
//! 3. `dirs::data_dir()/settle`
//!
//! Environment lookups go through a caller-supplied function so tests can
//! resolve against a fixed environment.

use crate::config::schema::{
    CONFIG_FILE, MAX_TIMEOUT_MS, MIN_TIMEOUT_MS, OutputFormat, SettleConfig,
};
use crate::i18n::DEFAULT_LANGUAGE;
use crate::initializer::DEFAULT_APP_ID;
use crate::remote::DEFAULT_TIMEOUT_MS;
use crate::{Error, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const APP_ID_ENV: &str = "SETTLE_APP_ID";
pub const LANGUAGE_ENV: &str = "SETTLE_LANGUAGE";
pub const SERVER_URL_ENV: &str = "SETTLE_SERVER_URL";
pub const DATA_DIR_ENV: &str = "SETTLE_DATA_DIR";

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl
    ConfigFile,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::ConfigFile => write!(f, "config"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

impl Serialize for ValueSource {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, Serialize)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    pub app_id: Resolved<String>,
    pub language: Resolved<String>,
    pub server_url: Resolved<String>,
    pub timeout_ms: Resolved<u64>,
    pub output_format: Resolved<OutputFormat>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            app_id: Resolved::new(DEFAULT_APP_ID.to_string(), ValueSource::Default),
            language: Resolved::new(DEFAULT_LANGUAGE.to_string(), ValueSource::Default),
            server_url: Resolved::new(DEFAULT_SERVER_URL.to_string(), ValueSource::Default),
            timeout_ms: Resolved::new(DEFAULT_TIMEOUT_MS, ValueSource::Default),
            output_format: Resolved::new(OutputFormat::Json, ValueSource::Default),
        }
    }
}

impl ResolvedConfig {
    pub fn app_id(&self) -> &str {
        &self.app_id.value
    }

    pub fn language(&self) -> &str {
        &self.language.value
    }

    pub fn server_url(&self) -> &str {
        &self.server_url.value
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms.value
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }

    /// `(key, value, source)` rows in config.kdl key order.
    pub fn entries(&self) -> Vec<(&'static str, String, &ValueSource)> {
        vec![
            ("app-id", self.app_id.value.clone(), &self.app_id.source),
            ("language", self.language.value.clone(), &self.language.source),
            ("server-url", self.server_url.value.clone(), &self.server_url.source),
            ("timeout-ms", self.timeout_ms.value.to_string(), &self.timeout_ms.source),
            (
                "output-format",
                self.output_format.value.as_str().to_string(),
                &self.output_format.source,
            ),
        ]
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub app_id: Option<String>,
    pub language: Option<String>,
    pub server_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub output_format: Option<OutputFormat>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }
}

/// Pick the highest-precedence string among CLI, environment and file.
fn resolve_string(
    cli: &Option<String>,
    env_name: &str,
    env: &dyn Fn(&str) -> Option<String>,
    file: &Option<String>,
    default: &str,
) -> Resolved<String> {
    if let Some(value) = cli {
        return Resolved::new(value.clone(), ValueSource::CliFlag);
    }
    if let Some(value) = env(env_name).filter(|v| !v.is_empty()) {
        return Resolved::new(value, ValueSource::EnvVar(env_name.to_string()));
    }
    if let Some(value) = file {
        return Resolved::new(value.clone(), ValueSource::ConfigFile);
    }
    Resolved::new(default.to_string(), ValueSource::Default)
}

/// Resolve configuration against a loaded config file.
pub fn resolve_config_with(
    file: &SettleConfig,
    overrides: &ConfigOverrides,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let mut result = ResolvedConfig {
        app_id: resolve_string(&overrides.app_id, APP_ID_ENV, env, &file.app_id, DEFAULT_APP_ID),
        language: resolve_string(
            &overrides.language,
            LANGUAGE_ENV,
            env,
            &file.language,
            DEFAULT_LANGUAGE,
        ),
        server_url: resolve_string(
            &overrides.server_url,
            SERVER_URL_ENV,
            env,
            &file.server_url,
            DEFAULT_SERVER_URL,
        ),
        ..ResolvedConfig::default()
    };

    // Resolve timeout_ms
    if let Some(timeout) = overrides.timeout_ms {
        result.timeout_ms = Resolved::new(timeout, ValueSource::CliFlag);
    } else if let Some(timeout) = file.timeout_ms {
        result.timeout_ms = Resolved::new(timeout, ValueSource::ConfigFile);
    }
    if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&result.timeout_ms.value) {
        return Err(Error::InvalidInput(format!(
            "timeout-ms must be {}-{}, got {}",
            MIN_TIMEOUT_MS, MAX_TIMEOUT_MS, result.timeout_ms.value
        )));
    }

    // Resolve output_format
    if let Some(format) = overrides.output_format {
        result.output_format = Resolved::new(format, ValueSource::CliFlag);
    } else if let Some(format) = file.output_format {
        result.output_format = Resolved::new(format, ValueSource::ConfigFile);
    }

    Ok(result)
}

/// Resolve configuration from `<data_dir>/config.kdl` and the process environment.
pub fn resolve_config(data_dir: &Path, overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let file = SettleConfig::load(&config_path(data_dir))?;
    resolve_config_with(&file, overrides, &|name: &str| std::env::var(name).ok())
}

/// Path of config.kdl inside `data_dir`.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Resolve the data directory.
pub fn resolve_data_dir_with(
    cli: Option<&Path>,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<Resolved<PathBuf>> {
    if let Some(dir) = cli {
        return Ok(Resolved::new(dir.to_path_buf(), ValueSource::CliFlag));
    }
    if let Some(dir) = env(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(Resolved::new(
            PathBuf::from(dir),
            ValueSource::EnvVar(DATA_DIR_ENV.to_string()),
        ));
    }
    let base = dirs::data_dir()
        .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))?;
    Ok(Resolved::new(base.join("settle"), ValueSource::Default))
}

/// Resolve the data directory against the process environment.
pub fn resolve_data_dir(cli: Option<&Path>) -> Result<Resolved<PathBuf>> {
    resolve_data_dir_with(cli, &|name: &str| std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    // ==================== ValueSource Tests ====================

    #[test]
    fn test_value_source_display() {
        assert_eq!(
            format!("{}", ValueSource::EnvVar("FOO".to_string())),
            "env:FOO"
        );
        assert_eq!(format!("{}", ValueSource::ConfigFile), "config");
        assert_eq!(format!("{}", ValueSource::CliFlag), "cli");
        assert_eq!(format!("{}", ValueSource::Default), "default");
    }

    // ==================== Config Resolution Tests ====================

    #[test]
    fn test_resolve_config_defaults() {
        let config =
            resolve_config_with(&SettleConfig::new(), &ConfigOverrides::new(), &no_env).unwrap();

        assert_eq!(config.app_id(), "default");
        assert_eq!(config.language(), "en-US");
        assert_eq!(config.server_url(), "http://localhost:3000");
        assert_eq!(config.timeout_ms(), 10_000);
        assert_eq!(config.output_format(), OutputFormat::Json);
        assert!(config.entries().iter().all(|(_, _, s)| **s == ValueSource::Default));
    }

    #[test]
    fn test_resolve_config_precedence() {
        let file = SettleConfig {
            app_id: Some("from-file".to_string()),
            language: Some("fr-FR".to_string()),
            server_url: Some("http://file:1".to_string()),
            timeout_ms: Some(500),
            output_format: Some(OutputFormat::Human),
        };
        let env = env_of(&[(APP_ID_ENV, "from-env"), (LANGUAGE_ENV, "de-DE")]);
        let overrides = ConfigOverrides::new().with_app_id("from-cli");

        let config = resolve_config_with(&file, &overrides, &env).unwrap();

        assert_eq!(config.app_id(), "from-cli");
        assert_eq!(config.app_id.source, ValueSource::CliFlag);
        assert_eq!(config.language(), "de-DE");
        assert_eq!(
            config.language.source,
            ValueSource::EnvVar(LANGUAGE_ENV.to_string())
        );
        assert_eq!(config.server_url(), "http://file:1");
        assert_eq!(config.server_url.source, ValueSource::ConfigFile);
        assert_eq!(config.timeout_ms(), 500);
        assert_eq!(config.output_format(), OutputFormat::Human);
    }

    #[test]
    fn test_empty_env_is_ignored() {
        let env = env_of(&[(SERVER_URL_ENV, "")]);
        let config =
            resolve_config_with(&SettleConfig::new(), &ConfigOverrides::new(), &env).unwrap();
        assert_eq!(config.server_url.source, ValueSource::Default);
    }

    #[test]
    fn test_timeout_out_of_range() {
        let overrides = ConfigOverrides::new().with_timeout_ms(0);
        let err = resolve_config_with(&SettleConfig::new(), &overrides, &no_env).unwrap_err();
        assert!(err.to_string().contains("timeout-ms"));
    }

    #[test]
    fn test_resolve_config_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(config_path(dir.path()), "timeout-ms 1234\n").unwrap();
        let config = resolve_config(dir.path(), &ConfigOverrides::new()).unwrap();
        assert_eq!(config.timeout_ms(), 1234);
        assert_eq!(config.timeout_ms.source, ValueSource::ConfigFile);
    }

    // ==================== Data Dir Tests ====================

    #[test]
    fn test_data_dir_precedence() {
        let env = env_of(&[(DATA_DIR_ENV, "/tmp/from-env")]);

        let cli = resolve_data_dir_with(Some(Path::new("/tmp/from-cli")), &env).unwrap();
        assert_eq!(cli.value, PathBuf::from("/tmp/from-cli"));
        assert_eq!(cli.source, ValueSource::CliFlag);

        let from_env = resolve_data_dir_with(None, &env).unwrap();
        assert_eq!(from_env.value, PathBuf::from("/tmp/from-env"));
    }
}
