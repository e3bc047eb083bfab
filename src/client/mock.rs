//! Scripted identity provider client for unit tests.

use crate::User;
use crate::client::provider::{
    ClaimSet, IdentityProviderClient, LogoutOptions, RedirectLoginOptions,
};
use crate::error::ProviderError;
use async_trait::async_trait;
use std::cell::{Cell, RefCell};

#[derive(Default)]
pub(crate) struct MockIdentityProvider {
    pub authenticated: Cell<bool>,
    pub claims: RefCell<Option<ClaimSet>>,
    pub user: RefCell<Option<User>>,
    pub token: RefCell<Option<String>>,
    pub token_error: Cell<bool>,
    pub callback_error: Cell<bool>,

    pub logins: RefCell<Vec<RedirectLoginOptions>>,
    pub logouts: RefCell<Vec<LogoutOptions>>,
    pub callbacks: RefCell<Vec<String>>,
    pub claims_calls: Cell<usize>,
}

impl MockIdentityProvider {
    pub fn authenticated() -> Self {
        let mock = Self::default();
        mock.authenticated.set(true);
        mock
    }
}

#[async_trait(?Send)]
impl IdentityProviderClient for MockIdentityProvider {
    async fn is_authenticated(&self) -> Result<bool, ProviderError> {
        Ok(self.authenticated.get())
    }

    async fn login_with_redirect(&self, options: RedirectLoginOptions) -> Result<(), ProviderError> {
        self.logins.borrow_mut().push(options);
        Ok(())
    }

    async fn logout(&self, options: LogoutOptions) -> Result<(), ProviderError> {
        self.logouts.borrow_mut().push(options);
        self.authenticated.set(false);
        Ok(())
    }

    async fn get_id_token_claims(&self) -> Result<Option<ClaimSet>, ProviderError> {
        self.claims_calls.set(self.claims_calls.get() + 1);
        Ok(self.claims.borrow().clone())
    }

    async fn get_user(&self) -> Result<Option<User>, ProviderError> {
        Ok(self.user.borrow().clone())
    }

    async fn get_token_silently(&self) -> Result<Option<String>, ProviderError> {
        if self.token_error.get() {
            return Err(ProviderError::LoginRequired);
        }
        Ok(self.token.borrow().clone())
    }

    async fn handle_redirect_callback(&self, url: &str) -> Result<(), ProviderError> {
        self.callbacks.borrow_mut().push(url.to_string());
        // Suspend like a real token exchange so overlapping callers interleave.
        tokio::task::yield_now().await;
        if self.callback_error.get() {
            return Err(ProviderError::InvalidState);
        }
        self.authenticated.set(true);
        Ok(())
    }
}
