//! Asset domain: loading flags, errors and cached data keyed by resource name.

use super::{Domain, DomainSettings};
use crate::schema::Schema;
use serde_json::{Value, json};

/// Marker for the `asset` domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetSettings;

impl DomainSettings for AssetSettings {
    const DOMAIN: Domain = Domain::Asset;

    fn schema() -> Schema {
        Schema::object()
            .required(["loading", "error", "data"])
            .property(
                "loading",
                Schema::object().pattern_property(".*", Schema::boolean()),
            )
            .property(
                "error",
                Schema::object().pattern_property(
                    ".*",
                    Schema::object()
                        .property("message", Schema::string())
                        .property("code", Schema::string()),
                ),
            )
            .property(
                "data",
                Schema::object().pattern_property(".*", Schema::array()),
            )
    }

    fn defaults() -> Value {
        json!({
            "loading": {},
            "error": {},
            "data": {}
        })
    }
}
