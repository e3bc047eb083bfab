//! Permission values derived from ID token role claims.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Host-facing authorization value.
///
/// `Denied` plays the part of `false`: no session, no role claim, or a
/// post-processing function that refused access.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Permissions {
    #[default]
    Denied,
    Role(String),
    Roles(Vec<String>),
    /// Claim value that is neither a string nor a list of strings, passed through as is.
    Other(Value),
}

impl Permissions {
    /// Converts a raw claim value.
    pub fn from_claim(value: &Value) -> Self {
        match value {
            Value::Null | Value::Bool(false) => Permissions::Denied,
            Value::String(role) => Permissions::Role(role.clone()),
            Value::Array(items) => {
                let roles: Option<Vec<String>> = items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string))
                    .collect();
                match roles {
                    Some(roles) => Permissions::Roles(roles),
                    None => Permissions::Other(value.clone()),
                }
            }
            other => Permissions::Other(other.clone()),
        }
    }

    /// True unless access was denied.
    pub fn is_granted(&self) -> bool {
        !matches!(self, Permissions::Denied)
    }

    /// True if `role` is the single role or one of the roles.
    pub fn contains(&self, role: &str) -> bool {
        match self {
            Permissions::Role(r) => r == role,
            Permissions::Roles(roles) => roles.iter().any(|r| r == role),
            Permissions::Denied | Permissions::Other(_) => false,
        }
    }

    /// The single role, if this is one.
    pub fn as_role(&self) -> Option<&str> {
        match self {
            Permissions::Role(r) => Some(r),
            _ => None,
        }
    }
}

/// Collapses a set of roles into one coarse label: `admin`, then `user`, else denied.
///
/// Suitable as an `on_permissions` function.
pub fn coarse_role(roles: Permissions) -> Permissions {
    if roles.contains("admin") {
        Permissions::Role("admin".to_string())
    } else if roles.contains("user") {
        Permissions::Role("user".to_string())
    } else {
        Permissions::Denied
    }
}
