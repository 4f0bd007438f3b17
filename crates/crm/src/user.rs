//! `User` struct as emitted by the schema compiler.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::DecodeError;

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct User {
    #[serde(default, alias = "1", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>, // required
    #[serde(default, alias = "2", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>, // required
    #[serde(default, alias = "3", skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>, // required
}

/// Fields of [`User`] with their wire ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserField {
    Email,
    Password,
    Id,
}

impl UserField {
    pub const ALL: [UserField; 3] = [UserField::Email, UserField::Password, UserField::Id];

    pub fn wire_id(self) -> i16 {
        match self {
            UserField::Email => 1,
            UserField::Password => 2,
            UserField::Id => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UserField::Email => "email",
            UserField::Password => "password",
            UserField::Id => "id",
        }
    }

    pub fn find_by_id(id: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.wire_id() == id)
    }

    pub fn find_by_id_or_err(id: i16) -> Result<Self, DecodeError> {
        Self::find_by_id(id).ok_or(DecodeError::UnknownFieldId(id))
    }

    pub fn find_by_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl User {
    pub fn new(email: impl Into<String>, password: impl Into<String>, id: i32) -> Self {
        Self { email: Some(email.into()), password: Some(password.into()), id: Some(id) }
    }

    pub fn is_set(&self, field: UserField) -> bool {
        match field {
            UserField::Email => self.email.is_some(),
            UserField::Password => self.password.is_some(),
            UserField::Id => self.id.is_some(),
        }
    }

    pub fn clear(&mut self, field: UserField) {
        match field {
            UserField::Email => self.email = None,
            UserField::Password => self.password = None,
            UserField::Id => self.id = None,
        }
    }

    /// Check that every required field is present.
    pub fn validate(&self) -> Result<(), DecodeError> {
        match UserField::ALL.into_iter().find(|f| !self.is_set(*f)) {
            Some(missing) => Err(DecodeError::MissingField(missing.name())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lookup_by_id_and_name() {
        assert_eq!(UserField::find_by_id(2), Some(UserField::Password));
        assert_eq!(UserField::find_by_id(9), None);
        assert!(matches!(UserField::find_by_id_or_err(9), Err(DecodeError::UnknownFieldId(9))));
        assert_eq!(UserField::find_by_name("id"), Some(UserField::Id));
        assert_eq!(UserField::Email.wire_id(), 1);
    }

    #[test]
    fn validate_reports_first_missing_required_field() {
        let mut u = User::new("a@example.com", "pw", 7);
        assert!(u.validate().is_ok());
        u.clear(UserField::Password);
        assert!(!u.is_set(UserField::Password));
        assert!(matches!(u.validate(), Err(DecodeError::MissingField("password"))));
    }

    #[test]
    fn deserializes_by_name_or_wire_id() {
        let by_name: User = serde_json::from_value(serde_json::json!({ "email": "a@x", "password": "p", "id": 1 })).unwrap();
        let by_id: User = serde_json::from_value(serde_json::json!({ "1": "a@x", "2": "p", "3": 1 })).unwrap();
        assert_eq!(by_name, by_id);
    }
}
