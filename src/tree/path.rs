//! Typed key paths into settings trees.
//!
//! Paths are written in dotted form (`leftDrawer.width`) with optional
//! bracketed indices for arrays (`permissions[0]`). A bare numeric segment
//! (`permissions.0`) also addresses an array element when the node being
//! traversed is an array.
//!
//! Reads and writes share a single step function, so both reject traversal
//! through scalar nodes in the same way.

use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// One segment of a [`KeyPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object key
    Key(String),
    /// Array index
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Errors produced while parsing or walking a key path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path string is empty or has an empty segment (`a..b`, `.a`).
    #[error("malformed path '{0}'")]
    Malformed(String),

    /// A segment tried to descend into a scalar value.
    #[error("cannot traverse '{at}': value is {found}, not an object or array")]
    TraversesScalar { at: String, found: &'static str },

    /// An array index beyond the end of the array.
    #[error("index out of bounds at '{at}' (length {len})")]
    IndexOutOfBounds { at: String, len: usize },

    /// A key segment was used against an array.
    #[error("cannot use key '{key}' on array at '{at}'")]
    KeyOnArray { at: String, key: String },

    /// An index segment was used against an object.
    #[error("cannot use index {index} on object at '{at}'")]
    IndexOnObject { at: String, index: usize },
}

impl PathError {
    /// The path prefix at which the walk failed.
    pub fn location(&self) -> &str {
        match self {
            PathError::Malformed(path) => path,
            PathError::TraversesScalar { at, .. }
            | PathError::IndexOutOfBounds { at, .. }
            | PathError::KeyOnArray { at, .. }
            | PathError::IndexOnObject { at, .. } => at,
        }
    }
}

/// A parsed path into a settings tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyPath {
    segments: Vec<PathSegment>,
}

impl KeyPath {
    /// The empty path, addressing the root of a tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a dotted path such as `theme.primary` or `permissions[2]`.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let malformed = || PathError::Malformed(input.to_string());
        if input.is_empty() {
            return Err(malformed());
        }

        let mut segments = Vec::new();
        for part in input.split('.') {
            // `name[1][2]` splits into a key followed by indices
            let (key, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };
            if (key.is_empty() && rest.is_empty()) || key.contains(']') {
                return Err(malformed());
            }
            if !key.is_empty() {
                segments.push(PathSegment::Key(key.to_string()));
            }
            while !rest.is_empty() {
                let close = rest.find(']').ok_or_else(malformed)?;
                if !rest.starts_with('[') {
                    return Err(malformed());
                }
                let index = rest[1..close].parse::<usize>().map_err(|_| malformed())?;
                segments.push(PathSegment::Index(index));
                rest = &rest[close + 1..];
            }
        }

        Ok(Self { segments })
    }

    /// Path segments in traversal order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// Convenience for appending an object key.
    pub fn key(&self, key: &str) -> Self {
        self.child(PathSegment::Key(key.to_string()))
    }

    /// Convenience for appending an array index.
    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    fn prefix(&self, len: usize) -> String {
        KeyPath {
            segments: self.segments[..len].to_vec(),
        }
        .to_string()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i > 0 => write!(f, ".{}", key)?,
                other => write!(f, "{}", other)?,
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for KeyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Human-readable name of a JSON value's type.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Where a segment lands inside a container node.
enum Slot<'a> {
    Key(&'a str),
    Index(usize),
}

/// Resolve how `segment` addresses `node`, rejecting scalars and mismatches.
fn slot<'a>(
    node: &Value,
    segment: &'a PathSegment,
    path: &KeyPath,
    depth: usize,
) -> Result<Slot<'a>, PathError> {
    match (node, segment) {
        (Value::Object(_), PathSegment::Key(key)) => Ok(Slot::Key(key)),
        (Value::Object(_), PathSegment::Index(index)) => Err(PathError::IndexOnObject {
            at: path.prefix(depth),
            index: *index,
        }),
        (Value::Array(_), PathSegment::Index(index)) => Ok(Slot::Index(*index)),
        (Value::Array(_), PathSegment::Key(key)) => match key.parse::<usize>() {
            Ok(index) => Ok(Slot::Index(index)),
            Err(_) => Err(PathError::KeyOnArray {
                at: path.prefix(depth),
                key: key.clone(),
            }),
        },
        (scalar, _) => Err(PathError::TraversesScalar {
            at: path.prefix(depth),
            found: type_name(scalar),
        }),
    }
}

/// Read the value at `path`. Missing keys yield `Ok(None)`.
pub fn get_path<'a>(root: &'a Value, path: &KeyPath) -> Result<Option<&'a Value>, PathError> {
    let mut node = root;
    for (depth, segment) in path.segments().iter().enumerate() {
        let next = match slot(node, segment, path, depth)? {
            Slot::Key(key) => node.get(key),
            Slot::Index(index) => node.get(index),
        };
        match next {
            Some(child) => node = child,
            None => return Ok(None),
        }
    }
    Ok(Some(node))
}

/// Write `value` at `path`, creating intermediate objects for missing keys.
///
/// `null` intermediates are replaced by empty objects. Array indices may
/// address an existing element or append at `len`.
pub fn set_path(root: &mut Value, path: &KeyPath, value: Value) -> Result<(), PathError> {
    let Some((last, parents)) = path.segments().split_last() else {
        *root = value;
        return Ok(());
    };

    let mut node = root;
    for (depth, segment) in parents.iter().enumerate() {
        if node.is_null() {
            *node = Value::Object(Map::new());
        }
        node = match slot(node, segment, path, depth)? {
            Slot::Key(key) => {
                let Value::Object(map) = node else {
                    unreachable!("slot only yields keys for objects")
                };
                let child = map
                    .entry(key.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if child.is_null() {
                    *child = Value::Object(Map::new());
                }
                child
            }
            Slot::Index(index) => {
                let Value::Array(items) = node else {
                    unreachable!("slot only yields indices for arrays")
                };
                let len = items.len();
                items.get_mut(index).ok_or_else(|| PathError::IndexOutOfBounds {
                    at: path.prefix(depth + 1),
                    len,
                })?
            }
        };
    }

    let depth = parents.len();
    if node.is_null() {
        *node = Value::Object(Map::new());
    }
    match slot(node, last, path, depth)? {
        Slot::Key(key) => {
            if let Value::Object(map) = node {
                map.insert(key.to_string(), value);
            }
        }
        Slot::Index(index) => {
            if let Value::Array(items) = node {
                match index.cmp(&items.len()) {
                    std::cmp::Ordering::Less => items[index] = value,
                    std::cmp::Ordering::Equal => items.push(value),
                    std::cmp::Ordering::Greater => {
                        return Err(PathError::IndexOutOfBounds {
                            at: path.to_string(),
                            len: items.len(),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}
