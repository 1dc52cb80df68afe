use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use idgate_core::ValueObject;

/// Role identifier granted to an account.
///
/// Roles are opaque strings at this layer; enforcing what a role may do is the
/// resource server's job. Names are trimmed and lower-cased on construction so
/// `" Admin"` and `"admin"` are the same role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        let normalized = name.trim();
        if normalized.len() == name.len() && !normalized.chars().any(char::is_uppercase) {
            return Self(name);
        }
        Self(Cow::Owned(normalized.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.0.into_owned()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ValueObject for Role {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_normalized() {
        assert_eq!(Role::new(" Admin "), Role::new("admin"));
        assert_eq!(Role::new("Editor").as_str(), "editor");
    }

    #[test]
    fn deserialization_normalizes_too() {
        let role: Role = serde_json::from_str("\"SUPPORT\"").unwrap();
        assert_eq!(role.as_str(), "support");
    }
}
