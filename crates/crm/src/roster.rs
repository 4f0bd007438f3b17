//! `Roster` result record and its lean decoder.
//!
//! The decoder mirrors what a schema-lean wire decoder can do on its own:
//! scalars are materialized, but container elements stay generic nodes under
//! a capability marker until the normalizer resolves them against the field
//! table below.

#![forbid(unsafe_code)]

use std::sync::OnceLock;

use packnorm_core::{Capability, Container, Item, Node};
use packnorm_schema::{FieldDescriptor, FieldRef, FieldTable, Record};
use serde::Serialize;

use crate::{DecodeError, User};

#[derive(Debug, Clone, Default, Serialize)]
pub struct Roster {
    pub name: String,
    pub users: Container<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admins: Option<Container<User>>,
    pub tags: Container<String>,
    pub pending: Container<i64>,
    /// Declared through a type alias the schema compiler cannot see through.
    pub labels: Container<String>,
}

impl Roster {
    pub const VERSION: u32 = 1;

    /// Decode a top-level map node, staging container fields.
    pub fn decode(node: &Node, max_elements: usize) -> Result<Self, DecodeError> {
        if !node.as_value().is_object() {
            return Err(DecodeError::NotAMap(node.wire_type()));
        }
        let name = match node.get("name") {
            Some(n) => match n.into_value() {
                serde_json::Value::String(s) => s,
                other => {
                    return Err(DecodeError::WrongType {
                        field: "name",
                        expected: "str",
                        found: Node::new(other).wire_type(),
                    })
                }
            },
            None => return Err(DecodeError::MissingField("name")),
        };

        let admins = match node.get("admins") {
            None => None,
            Some(n) if n.as_value().is_null() => None,
            Some(n) => Some(Container::staged(Capability::Set, elements("admins", &n, max_elements)?)),
        };

        // labels are primitive strings; the decoder materializes them eagerly
        let labels = Container::Staged {
            capability: Capability::Sequence,
            items: field_elements(node, "labels", max_elements)?
                .into_iter()
                .map(|n| match n.as_value().as_str() {
                    Some(s) => Item::Value(s.to_string()),
                    None => Item::Node(n),
                })
                .collect(),
        };

        Ok(Self {
            name,
            users: Container::staged(Capability::Sequence, field_elements(node, "users", max_elements)?),
            admins,
            tags: Container::staged(Capability::Set, field_elements(node, "tags", max_elements)?),
            pending: Container::staged(Capability::BoundedQueue, field_elements(node, "pending", max_elements)?),
            labels,
        })
    }
}

fn field_elements(node: &Node, field: &'static str, max: usize) -> Result<Vec<Node>, DecodeError> {
    match node.get(field) {
        None => Ok(Vec::new()),
        Some(n) if n.as_value().is_null() => Ok(Vec::new()),
        Some(n) => elements(field, &n, max),
    }
}

fn elements(field: &'static str, node: &Node, max: usize) -> Result<Vec<Node>, DecodeError> {
    let items = node.elements().ok_or(DecodeError::WrongType {
        field,
        expected: "array",
        found: node.wire_type(),
    })?;
    if items.len() > max {
        return Err(DecodeError::TooManyElements { field, len: items.len(), max });
    }
    Ok(items)
}

impl Record for Roster {
    fn fields() -> &'static [FieldDescriptor<Self>] {
        static FIELDS: OnceLock<Vec<FieldDescriptor<Roster>>> = OnceLock::new();
        FIELDS.get_or_init(|| {
            FieldTable::<Roster>::new()
                .constant("VERSION")
                .scalar("name")
                .field("users", |r| FieldRef::from(&mut r.users))
                .field("admins", |r| FieldRef::from(&mut r.admins))
                .field("tags", |r| FieldRef::from(&mut r.tags))
                .field("pending", |r| FieldRef::from(&mut r.pending))
                .erased("labels", |r| FieldRef::from(&mut r.labels))
                .build()
        })
    }

    fn record_name() -> &'static str {
        "Roster"
    }
}
