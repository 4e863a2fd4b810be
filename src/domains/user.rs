//! User domain: profile, preferences and granted permissions.

use super::{Domain, DomainSettings};
use crate::schema::{Format, Schema};
use serde_json::{Value, json};

/// Marker for the `user` domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserSettings;

impl DomainSettings for UserSettings {
    const DOMAIN: Domain = Domain::User;

    fn schema() -> Schema {
        Schema::object()
            .required(["profile", "preferences", "permissions"])
            .property(
                "profile",
                Schema::object()
                    .required(["id", "email", "name"])
                    .property("id", Schema::string())
                    .property("email", Schema::string().format(Format::Email))
                    .property("name", Schema::string())
                    .property("avatar", Schema::string())
                    .property("timezone", Schema::string()),
            )
            .property(
                "preferences",
                Schema::object()
                    .required(["language", "notifications"])
                    .property("language", Schema::string())
                    .property(
                        "notifications",
                        Schema::object()
                            .property("email", Schema::boolean())
                            .property("push", Schema::boolean()),
                    ),
            )
            .property("permissions", Schema::array_of(Schema::string()))
    }

    fn defaults() -> Value {
        json!({
            "profile": {
                "id": "default",
                "email": "guest@example.com",
                "name": "Guest User",
                "avatar": "",
                "timezone": "UTC"
            },
            "preferences": {
                "language": "en-US",
                "notifications": {
                    "email": true,
                    "push": true
                }
            },
            "permissions": []
        })
    }
}
