//! The identity provider client consumed by the adapter and the header injector.

use crate::User;
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// ID token claims keyed by claim name.
pub type ClaimSet = Map<String, Value>;

/// Parameters forwarded to the authorization endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationParams {
    /// Where the provider sends the browser back with the authorization code.
    pub redirect_uri: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RedirectLoginOptions {
    pub authorization_params: AuthorizationParams,
}

impl RedirectLoginOptions {
    pub fn redirect_to(redirect_uri: impl Into<String>) -> Self {
        Self {
            authorization_params: AuthorizationParams {
                redirect_uri: Some(redirect_uri.into()),
            },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogoutParams {
    /// Where the provider sends the browser after ending its session.
    pub return_to: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogoutOptions {
    pub logout_params: LogoutParams,
}

impl LogoutOptions {
    pub fn return_to(url: impl Into<String>) -> Self {
        Self {
            logout_params: LogoutParams {
                return_to: Some(url.into()),
            },
        }
    }
}

/// Capability surface of an OAuth2/OIDC SPA client.
///
/// The client owns token storage and refresh. Every call may suspend and may fail.
#[async_trait(?Send)]
pub trait IdentityProviderClient {
    async fn is_authenticated(&self) -> Result<bool, ProviderError>;

    /// Starts the redirect login. On success the page is navigating away.
    async fn login_with_redirect(&self, options: RedirectLoginOptions) -> Result<(), ProviderError>;

    /// Ends the local and provider sessions and navigates to the return URL.
    async fn logout(&self, options: LogoutOptions) -> Result<(), ProviderError>;

    /// Claims of the current ID token, `None` without a session.
    async fn get_id_token_claims(&self) -> Result<Option<ClaimSet>, ProviderError>;

    /// Profile of the current user, `None` without a session.
    async fn get_user(&self) -> Result<Option<User>, ProviderError>;

    /// Access token, refreshed if needed. `None` when the user never logged in.
    async fn get_token_silently(&self) -> Result<Option<String>, ProviderError>;

    /// Exchanges the code carried by `url` for tokens. Fails on an invalid or
    /// already used code.
    async fn handle_redirect_callback(&self, url: &str) -> Result<(), ProviderError>;
}
