//! App domain: build metadata, runtime state, API configuration and the
//! feature-flag tree consumed by [`crate::features`].

use super::{Domain, DomainSettings};
use crate::schema::{Format, Schema, SchemaType};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};

/// Marker for the `app` domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppSettings;

/// A single feature: `{enabled, description?, required?, components?, ...}`.
fn feature() -> Schema {
    Schema::object()
        .required(["enabled"])
        .property("enabled", Schema::boolean())
        .property("description", Schema::string())
        .property("required", Schema::boolean())
        .property("components", Schema::array_of(Schema::string()))
        .property("expectedCoverage", Schema::number())
        .property("dependencies", Schema::array_of(Schema::string()))
}

/// A group of features or nested groups.
fn feature_group() -> Schema {
    Schema::object().additional_schema(Schema::any().any_of([Schema::boolean(), Schema::object()]))
}

impl DomainSettings for AppSettings {
    const DOMAIN: Domain = Domain::App;

    fn schema() -> Schema {
        Schema::object()
            .required(["meta", "state", "config", "features"])
            .property(
                "meta",
                Schema::object()
                    .required(["version", "buildNumber"])
                    .property("version", Schema::string())
                    .property("buildNumber", Schema::string())
                    .property("lastUpdate", Schema::string().format(Format::DateTime)),
            )
            .property(
                "state",
                Schema::object()
                    .required(["initialized", "online"])
                    .property("initialized", Schema::boolean())
                    .property("online", Schema::boolean())
                    .property(
                        "lastError",
                        Schema::of_types([SchemaType::Object, SchemaType::Null])
                            .property("message", Schema::string())
                            .property("timestamp", Schema::string().format(Format::DateTime)),
                    ),
            )
            .property(
                "config",
                Schema::object().required(["api"]).property(
                    "api",
                    Schema::object()
                        .required(["baseUrl", "timeout"])
                        .property("baseUrl", Schema::string())
                        .property("timeout", Schema::number().minimum(0.0)),
                ),
            )
            .property(
                "features",
                Schema::object()
                    .pattern_property("^.*$", Schema::any().any_of([feature(), feature_group()]))
                    .additional_properties(false),
            )
    }

    fn defaults() -> Value {
        json!({
            "meta": {
                "version": "1.0.0",
                "buildNumber": "1",
                "lastUpdate": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
            },
            "state": {
                "initialized": false,
                "online": true,
                "lastError": null
            },
            "config": {
                "api": {
                    "baseUrl": "https://api.example.com",
                    "timeout": 5000
                }
            },
            "features": {
                "core": {
                    "pwa": {
                        "enabled": true,
                        "description": "Installable app shell with service worker",
                        "required": true
                    },
                    "offline": {
                        "enabled": false,
                        "description": "Serve cached settings when the server is unreachable",
                        "dependencies": ["core.pwa"]
                    }
                },
                "ui": {
                    "layout": {
                        "quickMenu": {
                            "enabled": true,
                            "description": "Quick access menu in the header",
                            "components": ["QuickMenu"]
                        }
                    }
                }
            }
        })
    }
}
