//! Sample CRM data-transfer types.
//!
//! `User` is laid out the way the schema compiler emits structs; `Roster` is a
//! service result carrying containers of users and primitives.

#![forbid(unsafe_code)]

pub mod roster;
pub mod user;

pub use roster::Roster;
pub use user::{User, UserField};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("expected a map at the top level, found {0}")]
    NotAMap(&'static str),
    #[error("missing required field {0}")]
    MissingField(&'static str),
    #[error("field {field}: expected {expected}, found {found}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("field {field} holds {len} elements, more than the limit of {max}")]
    TooManyElements { field: &'static str, len: usize, max: usize },
    #[error("unknown field id {0}")]
    UnknownFieldId(i16),
}
