//! Compiled schema validation.
//!
//! [`Validator::compile`] turns a [`Schema`] into a tree of checks with all
//! regexes compiled up front. [`Validator::check`] walks a candidate tree and
//! collects every [`Violation`] in document order. Validators are immutable
//! and can be shared across threads; [`ValidatorCache`] holds one per domain.

use super::{AdditionalProperties, Format, Schema, SchemaType};
use crate::domains::Domain;
use crate::tree::{KeyPath, type_name};
use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// A single schema-conformance failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Dotted path of the offending value (empty for the root)
    pub path: String,
    /// What was wrong with it
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "<root>: {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Ordered list of violations; empty means valid.
pub type Violations = Vec<Violation>;

/// One-line summary of a violation list, for error messages and logs.
pub fn summarize(violations: &[Violation]) -> String {
    match violations {
        [] => "no violations".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{} (and {} more)", first, rest.len()),
    }
}

/// Outcome of checking a tree against a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub violations: Violations,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Convert to `Result`, failing with [`Error::SchemaViolation`].
    pub fn into_result(self) -> Result<()> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(Error::SchemaViolation(self.violations))
        }
    }
}

#[derive(Debug)]
enum Additional {
    Allowed,
    Denied,
    Schema(Box<Node>),
}

#[derive(Debug)]
struct Node {
    types: Vec<SchemaType>,
    required: Vec<String>,
    properties: Vec<(String, Node)>,
    pattern_properties: Vec<(Regex, Node)>,
    additional: Additional,
    items: Option<Box<Node>>,
    enumeration: Vec<Value>,
    minimum: Option<f64>,
    pattern: Option<Regex>,
    format: Option<Format>,
    one_of: Vec<Node>,
    any_of: Vec<Node>,
}

fn compile_regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::InvalidSchema(format!("invalid pattern '{}': {}", pattern, e)))
}

fn compile_all(schemas: &[Schema]) -> Result<Vec<Node>> {
    schemas.iter().map(Node::compile).collect()
}

impl Node {
    fn compile(schema: &Schema) -> Result<Self> {
        let properties = schema
            .properties
            .iter()
            .map(|(name, sub)| Ok((name.clone(), Node::compile(sub)?)))
            .collect::<Result<Vec<_>>>()?;

        let pattern_properties = schema
            .pattern_properties
            .iter()
            .map(|(pattern, sub)| Ok((compile_regex(pattern)?, Node::compile(sub)?)))
            .collect::<Result<Vec<_>>>()?;

        let additional = match &schema.additional_properties {
            AdditionalProperties::Allowed => Additional::Allowed,
            AdditionalProperties::Denied => Additional::Denied,
            AdditionalProperties::Schema(sub) => Additional::Schema(Box::new(Node::compile(sub)?)),
        };

        let items = match &schema.items {
            Some(sub) => Some(Box::new(Node::compile(sub)?)),
            None => None,
        };

        let pattern = match &schema.pattern {
            Some(pattern) => Some(compile_regex(pattern)?),
            None => None,
        };

        Ok(Self {
            types: schema.types.clone(),
            required: schema.required.clone(),
            properties,
            pattern_properties,
            additional,
            items,
            enumeration: schema.enumeration.clone(),
            minimum: schema.minimum,
            pattern,
            format: schema.format,
            one_of: compile_all(&schema.one_of)?,
            any_of: compile_all(&schema.any_of)?,
        })
    }
}

/// A compiled schema, ready to check candidate trees.
#[derive(Debug)]
pub struct Validator {
    root: Node,
    email: Regex,
}

impl Validator {
    /// Compile `schema`. Fails only if a pattern is not a valid regex.
    pub fn compile(schema: &Schema) -> Result<Self> {
        Ok(Self {
            root: Node::compile(schema)?,
            email: compile_regex(EMAIL_PATTERN)?,
        })
    }

    /// Check `value` against the schema, collecting all violations.
    pub fn check(&self, value: &Value) -> ValidationResult {
        let mut violations = Vec::new();
        self.check_node(&self.root, value, &KeyPath::root(), &mut violations);
        ValidationResult { violations }
    }

    /// Shorthand for `check(value).is_ok()`.
    pub fn is_valid(&self, value: &Value) -> bool {
        self.check(value).is_ok()
    }

    fn matches(&self, node: &Node, value: &Value, path: &KeyPath) -> bool {
        let mut scratch = Vec::new();
        self.check_node(node, value, path, &mut scratch);
        scratch.is_empty()
    }

    fn check_node(&self, node: &Node, value: &Value, path: &KeyPath, out: &mut Violations) {
        let here = || path.to_string();

        if !node.types.is_empty() && !node.types.iter().any(|t| t.matches(value)) {
            let expected: Vec<&str> = node.types.iter().map(SchemaType::as_str).collect();
            out.push(Violation::new(
                here(),
                format!("must be {}, found {}", expected.join(" or "), type_name(value)),
            ));
            return;
        }

        if !node.enumeration.is_empty() && !node.enumeration.contains(value) {
            let allowed: Vec<String> = node.enumeration.iter().map(Value::to_string).collect();
            out.push(Violation::new(
                here(),
                format!("must be one of [{}]", allowed.join(", ")),
            ));
        }

        match value {
            Value::Number(n) => {
                if let (Some(minimum), Some(actual)) = (node.minimum, n.as_f64()) {
                    if actual < minimum {
                        out.push(Violation::new(here(), format!("must be >= {}", minimum)));
                    }
                }
            }
            Value::String(s) => {
                if let Some(pattern) = &node.pattern {
                    if !pattern.is_match(s) {
                        out.push(Violation::new(
                            here(),
                            format!("must match pattern '{}'", pattern.as_str()),
                        ));
                    }
                }
                match node.format {
                    Some(Format::DateTime) if chrono::DateTime::parse_from_rfc3339(s).is_err() => {
                        out.push(Violation::new(here(), "must be a valid date-time"));
                    }
                    Some(Format::Email) if !self.email.is_match(s) => {
                        out.push(Violation::new(here(), "must be a valid email address"));
                    }
                    _ => {}
                }
            }
            Value::Object(map) => {
                for key in &node.required {
                    if !map.contains_key(key) {
                        out.push(Violation::new(path.key(key).to_string(), "is required"));
                    }
                }
                for (key, child) in map {
                    let child_path = path.key(key);
                    let mut listed = false;
                    if let Some((_, sub)) = node.properties.iter().find(|(name, _)| name == key) {
                        listed = true;
                        self.check_node(sub, child, &child_path, out);
                    }
                    for (pattern, sub) in &node.pattern_properties {
                        if pattern.is_match(key) {
                            listed = true;
                            self.check_node(sub, child, &child_path, out);
                        }
                    }
                    if !listed {
                        match &node.additional {
                            Additional::Allowed => {}
                            Additional::Denied => out.push(Violation::new(
                                child_path.to_string(),
                                "is not an allowed property",
                            )),
                            Additional::Schema(sub) => {
                                self.check_node(sub, child, &child_path, out)
                            }
                        }
                    }
                }
            }
            Value::Array(elements) => {
                if let Some(items) = &node.items {
                    for (i, element) in elements.iter().enumerate() {
                        self.check_node(items, element, &path.index(i), out);
                    }
                }
            }
            Value::Bool(_) | Value::Null => {}
        }

        if !node.one_of.is_empty() {
            let matched = node
                .one_of
                .iter()
                .filter(|alt| self.matches(alt, value, path))
                .count();
            if matched != 1 {
                out.push(Violation::new(
                    here(),
                    format!(
                        "must match exactly one of {} alternatives (matched {})",
                        node.one_of.len(),
                        matched
                    ),
                ));
            }
        }

        if !node.any_of.is_empty() && !node.any_of.iter().any(|alt| self.matches(alt, value, path))
        {
            out.push(Violation::new(
                here(),
                format!("must match at least one of {} alternatives", node.any_of.len()),
            ));
        }
    }
}

/// Compile-once cache of validators, keyed by domain.
///
/// Lookups take a read lock; only the first request for a domain compiles.
#[derive(Debug, Default)]
pub struct ValidatorCache {
    compiled: RwLock<HashMap<Domain, Arc<Validator>>>,
}

impl ValidatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached validator for `domain`, compiling `schema()` on first use.
    pub fn get_or_compile(
        &self,
        domain: Domain,
        schema: impl FnOnce() -> Schema,
    ) -> Result<Arc<Validator>> {
        if let Some(validator) = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&domain)
        {
            return Ok(Arc::clone(validator));
        }

        let mut compiled = self.compiled.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(validator) = compiled.get(&domain) {
            return Ok(Arc::clone(validator));
        }
        tracing::debug!(domain = %domain, "compiling schema");
        let validator = Arc::new(Validator::compile(&schema())?);
        compiled.insert(domain, Arc::clone(&validator));
        Ok(validator)
    }

    /// Number of compiled validators held.
    pub fn len(&self) -> usize {
        self.compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn drawer() -> Schema {
        Schema::object()
            .required(["show", "width", "behavior"])
            .property("show", Schema::boolean())
            .property("width", Schema::number().minimum(0.0))
            .property(
                "behavior",
                Schema::string().enumeration(["desktop", "mobile", "responsive"]),
            )
    }

    fn paths(result: &ValidationResult) -> Vec<&str> {
        result.violations.iter().map(|v| v.path.as_str()).collect()
    }

    #[test]
    fn test_valid_document() {
        let validator = Validator::compile(&drawer()).unwrap();
        let result = validator.check(&json!({"show": true, "width": 256, "behavior": "desktop"}));
        assert!(result.is_ok());
        assert!(result.into_result().is_ok());
    }

    #[test]
    fn test_missing_required() {
        let validator = Validator::compile(&drawer()).unwrap();
        let result = validator.check(&json!({"show": true}));
        assert_eq!(paths(&result), vec!["width", "behavior"]);
        assert!(result.violations.iter().all(|v| v.message == "is required"));
    }

    #[test]
    fn test_type_enum_and_minimum() {
        let validator = Validator::compile(&drawer()).unwrap();
        let result = validator.check(&json!({"show": "yes", "width": -1, "behavior": "tablet"}));
        assert_eq!(paths(&result), vec!["behavior", "show", "width"]);
        assert!(result.violations[1].message.contains("must be boolean, found string"));
        assert!(result.violations[2].message.contains(">= 0"));
    }

    #[test]
    fn test_root_type_mismatch() {
        let validator = Validator::compile(&drawer()).unwrap();
        let result = validator.check(&json!([]));
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].to_string(), "<root>: must be object, found array");
    }

    #[test]
    fn test_pattern() {
        let schema = Schema::object().property(
            "primary",
            Schema::string().pattern("^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$"),
        );
        let validator = Validator::compile(&schema).unwrap();
        assert!(validator.is_valid(&json!({"primary": "#1976D2"})));
        assert!(validator.is_valid(&json!({"primary": "#fff"})));
        assert!(!validator.is_valid(&json!({"primary": "blue"})));
    }

    #[test]
    fn test_formats() {
        let schema = Schema::object()
            .property("email", Schema::string().format(Format::Email))
            .property("at", Schema::string().format(Format::DateTime));
        let validator = Validator::compile(&schema).unwrap();

        assert!(validator.is_valid(&json!({
            "email": "guest@example.com",
            "at": "2026-01-31T09:00:00Z"
        })));
        let result = validator.check(&json!({"email": "not-an-email", "at": "yesterday"}));
        assert_eq!(paths(&result), vec!["at", "email"]);
    }

    #[test]
    fn test_additional_properties_denied() {
        let schema = Schema::object()
            .property("a", Schema::any())
            .additional_properties(false);
        let validator = Validator::compile(&schema).unwrap();
        let result = validator.check(&json!({"a": 1, "b": 2}));
        assert_eq!(result.violations, vec![Violation::new("b", "is not an allowed property")]);
    }

    #[test]
    fn test_pattern_properties() {
        let schema = Schema::object().property(
            "loading",
            Schema::object().pattern_property(".*", Schema::boolean()),
        );
        let validator = Validator::compile(&schema).unwrap();
        assert!(validator.is_valid(&json!({"loading": {"images": true, "video": false}})));

        let result = validator.check(&json!({"loading": {"images": "soon"}}));
        assert_eq!(paths(&result), vec!["loading.images"]);
    }

    #[test]
    fn test_array_items() {
        let schema = Schema::object().property("permissions", Schema::array_of(Schema::string()));
        let validator = Validator::compile(&schema).unwrap();
        let result = validator.check(&json!({"permissions": ["read", 7]}));
        assert_eq!(paths(&result), vec!["permissions[1]"]);
    }

    #[test]
    fn test_union_type() {
        let schema = Schema::object().property(
            "lastError",
            Schema::of_types([SchemaType::Object, SchemaType::Null])
                .property("message", Schema::string()),
        );
        let validator = Validator::compile(&schema).unwrap();
        assert!(validator.is_valid(&json!({"lastError": null})));
        assert!(validator.is_valid(&json!({"lastError": {"message": "boom"}})));
        let result = validator.check(&json!({"lastError": 3}));
        assert_eq!(result.violations[0].message, "must be object or null, found number");
    }

    #[test]
    fn test_one_of_and_any_of() {
        let one = Schema::any().one_of([Schema::string(), Schema::any()]);
        let validator = Validator::compile(&one).unwrap();
        assert!(validator.is_valid(&json!(1)));
        assert!(!validator.is_valid(&json!("both")));

        let any = Schema::any().any_of([Schema::boolean(), Schema::object()]);
        let validator = Validator::compile(&any).unwrap();
        assert!(validator.is_valid(&json!(true)));
        assert!(validator.is_valid(&json!({})));
        assert!(!validator.is_valid(&json!("no")));
    }

    #[test]
    fn test_invalid_pattern_fails_compile() {
        let schema = Schema::string().pattern("(unclosed");
        let err = Validator::compile(&schema).unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));
    }

    #[test]
    fn test_summarize() {
        assert_eq!(summarize(&[]), "no violations");
        let violations = vec![
            Violation::new("a", "is required"),
            Violation::new("b", "is required"),
        ];
        assert_eq!(summarize(&violations), "a: is required (and 1 more)");
    }

    #[test]
    fn test_cache_compiles_once() {
        let cache = ValidatorCache::new();
        let mut calls = 0;
        let first = cache
            .get_or_compile(Domain::Ui, || {
                calls += 1;
                Schema::object()
            })
            .unwrap();
        let second = cache
            .get_or_compile(Domain::Ui, || unreachable!("already compiled"))
            .unwrap();
        assert_eq!(calls, 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }
}
