//! Structural schemas for settings trees.
//!
//! A [`Schema`] is a declarative contract covering the subset of JSON Schema
//! the settings domains need:
//!
//! - `type` (single or union), `enum`, `minimum`, `pattern`, `format`
//! - `required`, `properties`, `patternProperties`, `additionalProperties`
//! - `items` for arrays
//! - `oneOf` / `anyOf` combinators
//!
//! Schemas are built with chained constructors and compiled once into a
//! [`validator::Validator`].
//!
//! ```
//! use settle::schema::Schema;
//!
//! let header = Schema::object()
//!     .required(["show", "height"])
//!     .property("show", Schema::boolean())
//!     .property("height", Schema::string().pattern(r"^\d+px$"));
//! # let _ = header;
//! ```

pub mod validator;

pub use validator::{ValidationResult, Validator, ValidatorCache, Violation, Violations, summarize};

use serde_json::Value;

/// Primitive JSON types a schema can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Null,
    Array,
    Object,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Null => "null",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
        }
    }

    /// Check whether `value` is of this type. Integers are numbers.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            SchemaType::String => value.is_string(),
            SchemaType::Number => value.is_number(),
            SchemaType::Integer => match value {
                Value::Number(n) => {
                    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
                }
                _ => false,
            },
            SchemaType::Boolean => value.is_boolean(),
            SchemaType::Null => value.is_null(),
            SchemaType::Array => value.is_array(),
            SchemaType::Object => value.is_object(),
        }
    }
}

impl std::fmt::Display for SchemaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Semantic string formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// RFC 3339 timestamp
    DateTime,
    /// Email address
    Email,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::DateTime => "date-time",
            Format::Email => "email",
        }
    }
}

/// Policy for object keys not listed in `properties` or matched by
/// `patternProperties`.
#[derive(Debug, Clone, Default)]
pub enum AdditionalProperties {
    /// Unlisted keys are accepted without checks (the default).
    #[default]
    Allowed,
    /// Unlisted keys are violations.
    Denied,
    /// Unlisted keys must satisfy this schema.
    Schema(Box<Schema>),
}

/// A structural contract for a JSON value.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub(crate) types: Vec<SchemaType>,
    pub(crate) required: Vec<String>,
    pub(crate) properties: Vec<(String, Schema)>,
    pub(crate) pattern_properties: Vec<(String, Schema)>,
    pub(crate) additional_properties: AdditionalProperties,
    pub(crate) items: Option<Box<Schema>>,
    pub(crate) enumeration: Vec<Value>,
    pub(crate) minimum: Option<f64>,
    pub(crate) pattern: Option<String>,
    pub(crate) format: Option<Format>,
    pub(crate) one_of: Vec<Schema>,
    pub(crate) any_of: Vec<Schema>,
}

impl Schema {
    /// A schema accepting any value.
    pub fn any() -> Self {
        Self::default()
    }

    /// A schema accepting any of the given types.
    pub fn of_types(types: impl IntoIterator<Item = SchemaType>) -> Self {
        Self {
            types: types.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn object() -> Self {
        Self::of_types([SchemaType::Object])
    }

    pub fn string() -> Self {
        Self::of_types([SchemaType::String])
    }

    pub fn number() -> Self {
        Self::of_types([SchemaType::Number])
    }

    pub fn integer() -> Self {
        Self::of_types([SchemaType::Integer])
    }

    pub fn boolean() -> Self {
        Self::of_types([SchemaType::Boolean])
    }

    pub fn null() -> Self {
        Self::of_types([SchemaType::Null])
    }

    /// An array whose elements satisfy `items`.
    pub fn array_of(items: Schema) -> Self {
        Self::of_types([SchemaType::Array]).items(items)
    }

    /// An array with unconstrained elements.
    pub fn array() -> Self {
        Self::of_types([SchemaType::Array])
    }

    /// Keys that must be present on an object.
    pub fn required<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Declare the schema for a named property.
    pub fn property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.properties.push((name.into(), schema));
        self
    }

    /// Declare the schema for every key matching `pattern` (a regex).
    pub fn pattern_property(mut self, pattern: impl Into<String>, schema: Schema) -> Self {
        self.pattern_properties.push((pattern.into(), schema));
        self
    }

    /// Accept (`true`) or reject (`false`) unlisted keys.
    pub fn additional_properties(mut self, allowed: bool) -> Self {
        self.additional_properties = if allowed {
            AdditionalProperties::Allowed
        } else {
            AdditionalProperties::Denied
        };
        self
    }

    /// Require unlisted keys to satisfy `schema`.
    pub fn additional_schema(mut self, schema: Schema) -> Self {
        self.additional_properties = AdditionalProperties::Schema(Box::new(schema));
        self
    }

    pub fn items(mut self, schema: Schema) -> Self {
        self.items = Some(Box::new(schema));
        self
    }

    /// Restrict the value to one of `values`.
    pub fn enumeration<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enumeration = values.into_iter().map(Into::into).collect();
        self
    }

    /// Inclusive lower bound for numbers.
    pub fn minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    /// Regex that strings must match (unanchored unless the pattern anchors).
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// The value must satisfy exactly one of `schemas`.
    pub fn one_of(mut self, schemas: impl IntoIterator<Item = Schema>) -> Self {
        self.one_of = schemas.into_iter().collect();
        self
    }

    /// The value must satisfy at least one of `schemas`.
    pub fn any_of(mut self, schemas: impl IntoIterator<Item = Schema>) -> Self {
        self.any_of = schemas.into_iter().collect();
        self
    }

    /// Look up a declared property schema.
    pub fn property_schema(&self, name: &str) -> Option<&Schema> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, schema)| schema)
    }

    /// Keys this schema requires.
    pub fn required_keys(&self) -> &[String] {
        &self.required
    }
}
