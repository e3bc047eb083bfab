//! Auth0 implementation of the host's authentication contract.
//!
//! [`Auth0AuthProvider`] keeps no session state of its own. Every capability
//! asks the identity provider client whether a session exists and then
//! decides between succeeding, redirecting to login, or failing with a
//! labelled [`AuthError`]. The only state it carries besides its options is
//! the [`CallbackGuard`] ensuring a login callback is processed once.

use crate::auth_provider::{ApiFailure, AuthProvider};
use crate::client::browser::{Location, Storage};
use crate::client::callback::{CallbackContext, CallbackGuard};
use crate::client::provider::{IdentityProviderClient, LogoutOptions, RedirectLoginOptions};
use crate::config::{AuthProviderOptions, CallbackCompletion, DEFAULT_LOGIN_CALLBACK_PATH};
use crate::error::AuthError;
use crate::permissions::Permissions;
use crate::user::Identity;
use async_trait::async_trait;
use std::rc::Rc;
use url::Url;

/// Storage key holding the URL the user was on before a login redirect.
pub const PREVIOUS_LOCATION_STORAGE_KEY: &str = "auth0_adapter.previous_location";

/// Adapter between an identity provider client and the host contract.
pub struct Auth0AuthProvider<C> {
    client: Rc<C>,
    location: Rc<dyn Location>,
    storage: Rc<dyn Storage>,
    options: AuthProviderOptions,
    callbacks: CallbackGuard,
}

impl<C: IdentityProviderClient> Auth0AuthProvider<C> {
    pub fn new(
        client: Rc<C>,
        location: Rc<dyn Location>,
        storage: Rc<dyn Storage>,
        options: AuthProviderOptions,
    ) -> Self {
        Self {
            client,
            location,
            storage,
            options,
            callbacks: CallbackGuard::new(),
        }
    }

    /// Adapter bound to `window.location` and `window.localStorage`.
    #[cfg(target_arch = "wasm32")]
    pub fn for_window(client: Rc<C>, options: AuthProviderOptions) -> Self {
        use crate::client::browser::{LocalStorage, WindowLocation};
        Self::new(client, Rc::new(WindowLocation), Rc::new(LocalStorage), options)
    }

    pub fn options(&self) -> &AuthProviderOptions {
        &self.options
    }

    /// Reads and forgets the location recorded before the last login redirect.
    pub fn take_previous_location(&self) -> Option<String> {
        let previous = self.storage.get_item(PREVIOUS_LOCATION_STORAGE_KEY)?;
        self.storage.remove_item(PREVIOUS_LOCATION_STORAGE_KEY);
        Some(previous)
    }

    fn login_redirect_uri(&self) -> String {
        self.options.login_redirect_uri.clone().unwrap_or_else(|| {
            format!("{}{}", self.location.origin(), DEFAULT_LOGIN_CALLBACK_PATH)
        })
    }

    fn logout_redirect_uri(&self) -> String {
        self.options
            .logout_redirect_uri
            .clone()
            .unwrap_or_else(|| self.location.origin())
    }

    async fn redirect_to_login(&self) -> Result<(), AuthError> {
        let redirect_uri = self.login_redirect_uri();
        tracing::trace!("Redirecting to identity provider, callback: {}", redirect_uri);
        self.client
            .login_with_redirect(RedirectLoginOptions::redirect_to(redirect_uri))
            .await?;
        Ok(())
    }

    /// Drops the callback query from the location, or reloads the page.
    fn consume_callback_location(&self) -> Result<(), AuthError> {
        match self.options.callback_completion {
            CallbackCompletion::ReplaceState => {
                let href = self.location.href();
                let cleaned = match Url::parse(&href) {
                    Ok(mut url) => {
                        url.set_query(None);
                        url.set_fragment(None);
                        url.to_string()
                    }
                    Err(_) => "/".to_string(),
                };
                self.location.replace_state(&cleaned)?;
            }
            CallbackCompletion::Reload => self.location.reload()?,
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl<C: IdentityProviderClient> AuthProvider for Auth0AuthProvider<C> {
    async fn login(&self) -> Result<(), AuthError> {
        self.redirect_to_login().await
    }

    async fn logout(&self) -> Result<Option<String>, AuthError> {
        // The host also calls logout after a failed check_auth; with no
        // session, doing nothing keeps it from looping through the provider.
        if !self.client.is_authenticated().await? {
            tracing::trace!("Logout requested without a session, nothing to do");
            return Ok(None);
        }

        let return_to = self.logout_redirect_uri();
        tracing::trace!("Logging out, returning to {}", return_to);
        self.client
            .logout(LogoutOptions::return_to(return_to.clone()))
            .await?;
        Ok(Some(return_to))
    }

    fn check_error(&self, error: &dyn ApiFailure) -> Result<(), AuthError> {
        match error.status() {
            Some(401 | 403) => Err(AuthError::Unauthorized {
                redirect_in_progress: false,
            }),
            _ => Ok(()),
        }
    }

    async fn check_auth(&self) -> Result<(), AuthError> {
        if self.client.is_authenticated().await? {
            return Ok(());
        }

        if !self.options.redirect_on_check_auth {
            tracing::trace!("No session and auto-redirect disabled");
            return Err(AuthError::Unauthorized {
                redirect_in_progress: false,
            });
        }

        self.storage
            .set_item(PREVIOUS_LOCATION_STORAGE_KEY, &self.location.href());
        self.redirect_to_login().await?;
        Err(AuthError::Unauthorized {
            redirect_in_progress: true,
        })
    }

    async fn get_permissions(&self) -> Result<Permissions, AuthError> {
        if !self.client.is_authenticated().await? {
            return Ok(Permissions::Denied);
        }

        let claims = self.client.get_id_token_claims().await?.unwrap_or_default();
        let raw = match self.options.role_claim.resolve(&claims) {
            Some((key, value)) => {
                tracing::trace!("Role claim found under {}", key);
                Permissions::from_claim(value)
            }
            None => {
                tracing::trace!("No role claim in ID token");
                Permissions::Denied
            }
        };

        Ok(match &self.options.on_permissions {
            Some(map) => map(raw),
            None => raw,
        })
    }

    async fn get_identity(&self) -> Result<Identity, AuthError> {
        if !self.client.is_authenticated().await? {
            return Err(AuthError::IdentityUnavailable);
        }

        let user = self
            .client
            .get_user()
            .await?
            .ok_or(AuthError::IdentityUnavailable)?;
        Ok(Identity::from(user))
    }

    async fn handle_callback(&self) -> Result<Option<String>, AuthError> {
        let context =
            CallbackContext::detect(&self.location.search()).ok_or(AuthError::NoPendingCallback)?;

        if !self.callbacks.claim(&context) {
            tracing::warn!("Login callback already processed, ignoring");
            return Err(AuthError::NoPendingCallback);
        }

        if let Err(e) = self
            .client
            .handle_redirect_callback(&self.location.href())
            .await
        {
            tracing::error!("Failed to handle login callback: {}", e);
            return Err(AuthError::CallbackFailure {
                message: e.to_string(),
            });
        }

        self.consume_callback_location()?;
        tracing::trace!("Login callback handled");
        Ok(self.take_previous_location())
    }
}
