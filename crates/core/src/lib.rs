//! packnorm core types: generic wire nodes, typed containers and the remap policy.

#![forbid(unsafe_code)]

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub mod container;
pub mod policy;
pub mod remap;

pub use container::{BoundedQueue, Container};
pub use policy::{Policy, Replacement};
pub use remap::{Remap, Remapped};

pub mod prelude {
    pub use super::{
        BoundedQueue, Capability, Container, Element, ElementType, Error, Item, Kind, Node, Policy,
        Remap, Remapped, Result, Shape,
    };
}

/// Self-describing value handed out by the wire decoder.
///
/// A node knows its own wire shape but not the application type it stands for;
/// `convert_to` materializes it once the caller names that type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Node(serde_json::Value);

impl Node {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }

    /// Wire-level type tag, as reported in conversion errors.
    pub fn wire_type(&self) -> &'static str {
        use serde_json::Value;
        match &self.0 {
            Value::Null => "nil",
            Value::Bool(_) => "bool",
            Value::Number(n) if n.is_f64() => "float",
            Value::Number(_) => "int",
            Value::String(_) => "str",
            Value::Array(_) => "array",
            Value::Object(_) => "map",
        }
    }

    /// Child nodes when this node is an array.
    pub fn elements(&self) -> Option<Vec<Node>> {
        self.0
            .as_array()
            .map(|arr| arr.iter().cloned().map(Node).collect())
    }

    /// Map entry lookup when this node is a map.
    pub fn get(&self, key: &str) -> Option<Node> {
        self.0.get(key).cloned().map(Node)
    }

    /// Convert into `T`; the node itself is left untouched.
    pub fn convert_to<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.0).map_err(|source| Error::NodeConversionFailed {
            field: None,
            index: None,
            target: std::any::type_name::<T>(),
            wire_type: self.wire_type(),
            source,
        })
    }
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

// Must agree with the derived `Eq`: ints and floats never compare equal, and
// `-0.0 == 0.0`.
impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(&self.0, state);
    }
}

fn hash_value<H: Hasher>(value: &serde_json::Value, state: &mut H) {
    use serde_json::Value;
    std::mem::discriminant(value).hash(state);
    match value {
        Value::Null => {}
        Value::Bool(b) => b.hash(state),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                (0u8, u).hash(state);
            } else if let Some(i) = n.as_i64() {
                (1u8, i).hash(state);
            } else if let Some(f) = n.as_f64() {
                let f = if f == 0.0 { 0.0 } else { f };
                (2u8, f.to_bits()).hash(state);
            }
        }
        Value::String(s) => s.hash(state),
        Value::Array(arr) => {
            arr.len().hash(state);
            for v in arr {
                hash_value(v, state);
            }
        }
        // keys iterate in sorted order
        Value::Object(map) => {
            map.len().hash(state);
            for (k, v) in map {
                k.hash(state);
                hash_value(v, state);
            }
        }
    }
}

/// One slot of a decoded container: either still a generic node or already a plain value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Item<T> {
    Node(Node),
    Value(T),
}

impl<T> Item<T> {
    pub fn node(value: serde_json::Value) -> Self {
        Item::Node(Node(value))
    }

    pub fn is_node(&self) -> bool {
        matches!(self, Item::Node(_))
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Item::Value(v) => Some(v),
            Item::Node(_) => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Item::Value(v) => Some(v),
            Item::Node(_) => None,
        }
    }
}

/// Bounds a declared element type must satisfy to be remapped.
pub trait Element: DeserializeOwned + Hash + Eq + fmt::Debug + Send + 'static {}

impl<T> Element for T where T: DeserializeOwned + Hash + Eq + fmt::Debug + Send + 'static {}

/// Whether the field metadata could name the container's element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    Declared,
    Unresolved,
}

impl ElementType {
    pub fn is_resolved(self) -> bool {
        matches!(self, ElementType::Declared)
    }
}

/// Abstract container capability, as staged by a decoder that knows no concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Set,
    Sequence,
    BoundedQueue,
    Deque,
}

/// Concrete, instantiable container kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Vec,
    VecDeque,
    HashSet,
    BoundedQueue,
}

/// Observed runtime kind of a container value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Concrete(Kind),
    Marker(Capability),
    Foreign(&'static str),
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Concrete(kind) => write!(f, "{:?}", kind),
            Shape::Marker(cap) => write!(f, "{:?} (capability)", cap),
            Shape::Foreign(name) => write!(f, "foreign {}", name),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("field access denied: {record}.{field}")]
    FieldAccessDenied {
        record: &'static str,
        field: &'static str,
    },
    #[error("container kind unsupported for field {field}: {shape}")]
    ContainerKindUnsupported { field: &'static str, shape: Shape },
    #[error("unresolved element type for field {field}: generic node at index {index}")]
    UnresolvedElementType { field: &'static str, index: usize },
    #[error("node conversion failed{}: {wire_type} into {target}", location(.field, .index))]
    NodeConversionFailed {
        field: Option<&'static str>,
        index: Option<usize>,
        target: &'static str,
        wire_type: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Attach the field and element position to a conversion failure.
    pub fn locate(self, at_field: &'static str, at_index: usize) -> Self {
        match self {
            Error::NodeConversionFailed { target, wire_type, source, .. } => Error::NodeConversionFailed {
                field: Some(at_field),
                index: Some(at_index),
                target,
                wire_type,
                source,
            },
            other => other,
        }
    }
}

fn location(field: &Option<&'static str>, index: &Option<usize>) -> String {
    match (field, index) {
        (Some(f), Some(i)) => format!(" at {}[{}]", f, i),
        (Some(f), None) => format!(" at {}", f),
        _ => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
