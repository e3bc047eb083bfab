//! The host application's pluggable authentication contract.
//!
//! A host (admin UI, dashboard) calls these capabilities at fixed lifecycle
//! points: `check_auth` on every protected navigation, `check_error` when an
//! API call fails, `get_permissions` when rendering permission-gated views.
//! It only ever sees the generic vocabulary defined here; the protocol
//! details live in the implementation.

use crate::error::AuthError;
use crate::permissions::Permissions;
use crate::user::Identity;
use async_trait::async_trait;

/// An API call failure as the host sees it.
pub trait ApiFailure {
    /// HTTP status if the failure carries one.
    fn status(&self) -> Option<u16>;
}

impl ApiFailure for u16 {
    fn status(&self) -> Option<u16> {
        Some(*self)
    }
}

/// Authentication capabilities delegated by the host.
#[async_trait(?Send)]
pub trait AuthProvider {
    /// Starts the login flow from a custom login page.
    async fn login(&self) -> Result<(), AuthError>;

    /// Logs out. Returns the URL the user is sent to, or `None` when there
    /// was no session to end.
    async fn logout(&self) -> Result<Option<String>, AuthError>;

    /// Classifies a failed API call. Fails with `Unauthorized` on 401 and 403.
    fn check_error(&self, error: &dyn ApiFailure) -> Result<(), AuthError>;

    /// Succeeds when a session exists.
    async fn check_auth(&self) -> Result<(), AuthError>;

    /// Permissions of the current user; `Denied` without a session.
    async fn get_permissions(&self) -> Result<Permissions, AuthError>;

    async fn get_identity(&self) -> Result<Identity, AuthError>;

    /// Completes a redirect login. Returns the location the user was on
    /// before being sent to the identity provider, if one was recorded.
    async fn handle_callback(&self) -> Result<Option<String>, AuthError>;
}
