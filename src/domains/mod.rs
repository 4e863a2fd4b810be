//! Configuration domains and their schema/defaults pairs.
//!
//! Each domain is an independent namespace with exactly one schema and one
//! defaults tree:
//!
//! - `ui` - layout, drawers, theme, toolbar, animation and behavior switches
//! - `app` - build metadata, runtime state, API config, feature flags
//! - `user` - profile, preferences, permissions
//! - `asset` - per-resource loading/error/data maps
//!
//! Defaults must satisfy their own schema; this is enforced by tests rather
//! than at runtime.

pub mod app;
pub mod asset;
pub mod ui;
pub mod user;

pub use app::AppSettings;
pub use asset::AssetSettings;
pub use ui::UiSettings;
pub use user::UserSettings;

use crate::schema::Schema;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A configuration namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Ui,
    App,
    User,
    Asset,
}

impl Domain {
    /// All domains, in initialization order.
    pub const ALL: [Domain; 4] = [Domain::Ui, Domain::App, Domain::User, Domain::Asset];

    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ui" => Some(Domain::Ui),
            "app" => Some(Domain::App),
            "user" => Some(Domain::User),
            "asset" => Some(Domain::Asset),
            _ => None,
        }
    }

    /// Name used in remote payloads and as the persistence key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Ui => "ui",
            Domain::App => "app",
            Domain::User => "user",
            Domain::Asset => "asset",
        }
    }

    pub fn schema(&self) -> Schema {
        match self {
            Domain::Ui => UiSettings::schema(),
            Domain::App => AppSettings::schema(),
            Domain::User => UserSettings::schema(),
            Domain::Asset => AssetSettings::schema(),
        }
    }

    pub fn defaults(&self) -> Value {
        match self {
            Domain::Ui => UiSettings::defaults(),
            Domain::App => AppSettings::defaults(),
            Domain::User => UserSettings::defaults(),
            Domain::Asset => AssetSettings::defaults(),
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::UnknownDomain(s.to_string()))
    }
}

/// Static description of a domain: its name, schema and defaults.
///
/// Implemented by a marker type per domain and used to parameterize
/// [`crate::store::ValidatedStore`].
pub trait DomainSettings: Send + Sync + 'static {
    const DOMAIN: Domain;

    /// The structural contract for this domain's tree.
    fn schema() -> Schema;

    /// Compiled-in defaults, the lowest-priority layer.
    fn defaults() -> Value;
}

/// Hex colour used by theme entries.
pub(crate) const HEX_COLOR: &str = "^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$";

/// CSS length such as `64px`, `1.5rem` or `100%`.
pub(crate) const CSS_LENGTH: &str = r"^\d+(\.\d+)?(px|rem|em|vh|%)$";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Validator;

    #[test]
    fn test_domain_parse() {
        assert_eq!(Domain::parse("ui"), Some(Domain::Ui));
        assert_eq!(Domain::parse("APP"), Some(Domain::App));
        assert_eq!(Domain::parse("resource"), None);
        assert!(matches!(
            "nope".parse::<Domain>(),
            Err(Error::UnknownDomain(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_domain_display_roundtrip() {
        for domain in Domain::ALL {
            assert_eq!(Domain::parse(&domain.to_string()), Some(domain));
        }
    }

    #[test]
    fn test_defaults_satisfy_schema() {
        for domain in Domain::ALL {
            let validator = Validator::compile(&domain.schema()).unwrap();
            let result = validator.check(&domain.defaults());
            assert!(
                result.is_ok(),
                "{} defaults fail their schema: {:?}",
                domain,
                result.violations
            );
        }
    }

    #[test]
    fn test_domain_serde() {
        assert_eq!(serde_json::to_string(&Domain::Asset).unwrap(), "\"asset\"");
        let parsed: Domain = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(parsed, Domain::User);
    }
}
