//! User profile returned by the identity provider and the identity record
//! handed to the host.

use serde::{Deserialize, Serialize};

/// Profile of the logged-in user as the identity provider reports it.
///
/// The fields correspond to standard OpenID Connect claims.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Subject claim, e.g. `auth0|<user_id>`.
    #[serde(rename = "sub")]
    pub id: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    /// URL to the user's profile picture.
    #[serde(default)]
    pub picture: Option<String>,
}

impl User {
    /// Creates a new User with the given ID and no profile details.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            name: None,
            picture: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }
}

/// Identity record shown by the host (user menu, audit fields).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// The user's email, or the subject when the email scope was not granted.
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Identity {
    /// Name to display, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.id)
    }
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            id: user.email.unwrap_or(user.id),
            full_name: user.name,
            avatar: user.picture,
        }
    }
}
