//! Auth0 single page application client.
//!
//! Implements [`IdentityProviderClient`] with the authorization code flow and
//! PKCE. The login transaction (state, code verifier, redirect URI) survives
//! the round trip through Auth0 in [`Storage`]; tokens live in a
//! [`TokenStorage`].
//!
//! # Flow
//!
//! 1. `login_with_redirect` generates PKCE parameters, stores the transaction
//!    and navigates to `/authorize`
//! 2. Auth0 redirects back with `code` and `state`
//! 3. `handle_redirect_callback` validates the state and exchanges the code
//!    at `/oauth/token`
//! 4. `get_token_silently` serves the access token and renews it with the
//!    refresh token once it expires

use crate::Auth0Config;
use crate::User;
use crate::client::browser::{Location, Storage};
use crate::client::jwt::{decode_claims, decode_id_token_to_user};
use crate::client::pkce;
use crate::client::provider::{
    ClaimSet, IdentityProviderClient, LogoutOptions, RedirectLoginOptions,
};
use crate::client::token_storage::{StoredTokens, TokenStorage};
use crate::error::ProviderError;
use async_trait::async_trait;
use futures::lock::Mutex;
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use url::Url;

/// Storage key for the pending login transaction.
pub const TRANSACTION_STORAGE_KEY: &str = "auth0_adapter.transaction";

/// Login started by this browser and not yet completed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
struct LoginTransaction {
    state: String,
    code_verifier: String,
    redirect_uri: String,
}

/// Query parameters Auth0 appends to the callback URL.
#[derive(Debug, Default, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Token response from Auth0.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Omitted by some refresh responses.
    id_token: Option<String>,
    expires_in: u64,
    refresh_token: Option<String>,
}

/// Error response from Auth0.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    error_description: Option<String>,
}

pub struct Auth0Client {
    config: Auth0Config,
    location: Rc<dyn Location>,
    storage: Rc<dyn Storage>,
    tokens: TokenStorage,
    /// Held while a refresh grant is in flight.
    refresh_lock: Mutex<()>,
    http: reqwest::Client,
}

impl Auth0Client {
    /// Creates a client and restores any session persisted in `storage`.
    pub fn new(config: Auth0Config, location: Rc<dyn Location>, storage: Rc<dyn Storage>) -> Self {
        let client = Self {
            config,
            location,
            tokens: TokenStorage::new(storage.clone()),
            storage,
            refresh_lock: Mutex::new(()),
            http: reqwest::Client::new(),
        };
        client.restore();
        client
    }

    /// Reloads tokens persisted by an earlier page load. Returns true if a
    /// session was found.
    pub fn restore(&self) -> bool {
        let restored = self.tokens.initialize();
        if restored {
            tracing::trace!("Restored Auth0 session from storage");
        }
        restored
    }

    /// Client bound to `window.location` and `window.localStorage`.
    #[cfg(target_arch = "wasm32")]
    pub fn for_window(config: Auth0Config) -> Self {
        use crate::client::browser::{LocalStorage, WindowLocation};
        Self::new(config, Rc::new(WindowLocation), Rc::new(LocalStorage))
    }

    /// Replaces the HTTP client used to reach the token endpoint.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn config(&self) -> &Auth0Config {
        &self.config
    }

    fn store_transaction(&self, transaction: &LoginTransaction) {
        match serde_json::to_string(transaction) {
            Ok(json) => self.storage.set_item(TRANSACTION_STORAGE_KEY, &json),
            Err(e) => tracing::warn!("Failed to serialize login transaction: {}", e),
        }
    }

    /// Reads and removes the pending transaction. A transaction is used once.
    fn take_transaction(&self) -> Option<LoginTransaction> {
        let raw = self.storage.get_item(TRANSACTION_STORAGE_KEY)?;
        self.storage.remove_item(TRANSACTION_STORAGE_KEY);

        match serde_json::from_str(&raw) {
            Ok(transaction) => Some(transaction),
            Err(e) => {
                tracing::warn!("Discarding unreadable login transaction: {}", e);
                None
            }
        }
    }

    async fn request_tokens(&self, form: &[(&str, &str)]) -> Result<TokenResponse, ProviderError> {
        let response = self
            .http
            .post(self.config.token_url())
            .form(form)
            .send()
            .await?;

        if response.status().is_success() {
            return response.json::<TokenResponse>().await.map_err(|e| {
                ProviderError::TokenExchange(format!("Failed to parse token response: {}", e))
            });
        }

        let status = response.status();
        match response.json::<ErrorResponse>().await {
            Ok(error) => Err(ProviderError::TokenExchange(format!(
                "{}: {}",
                error.error,
                error.error_description.unwrap_or_default()
            ))),
            Err(_) => Err(ProviderError::TokenExchange(format!(
                "token endpoint answered {}",
                status
            ))),
        }
    }

    async fn exchange_code(
        &self,
        code: &str,
        transaction: &LoginTransaction,
    ) -> Result<(), ProviderError> {
        tracing::trace!("Exchanging authorization code for tokens");

        let response = self
            .request_tokens(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.config.client_id.as_str()),
                ("code", code),
                ("code_verifier", transaction.code_verifier.as_str()),
                ("redirect_uri", transaction.redirect_uri.as_str()),
            ])
            .await?;

        let id_token = response.id_token.ok_or_else(|| {
            ProviderError::TokenExchange("token response carries no id_token".to_string())
        })?;
        decode_claims(&id_token)?;

        self.tokens.store(
            StoredTokens::new(response.access_token, id_token, response.expires_in)
                .with_refresh_token(response.refresh_token),
        );
        Ok(())
    }

    async fn refresh(&self, expired: StoredTokens, refresh_token: &str) -> Result<String, ProviderError> {
        tracing::trace!("Access token expired, refreshing");

        let response = self
            .request_tokens(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.config.client_id.as_str()),
                ("refresh_token", refresh_token),
            ])
            .await?;

        let access_token = response.access_token.clone();
        self.tokens.store(
            StoredTokens::new(
                response.access_token,
                response.id_token.unwrap_or(expired.id_token),
                response.expires_in,
            )
            // Rotation hands out a new refresh token; otherwise the old one stays valid.
            .with_refresh_token(response.refresh_token.or(expired.refresh_token)),
        );
        Ok(access_token)
    }
}

#[async_trait(?Send)]
impl IdentityProviderClient for Auth0Client {
    async fn is_authenticated(&self) -> Result<bool, ProviderError> {
        match self.get_token_silently().await {
            Ok(token) => Ok(token.is_some()),
            Err(ProviderError::Http(e)) => Err(ProviderError::Http(e)),
            Err(e) => {
                tracing::trace!("No usable session: {}", e);
                Ok(false)
            }
        }
    }

    async fn login_with_redirect(&self, options: RedirectLoginOptions) -> Result<(), ProviderError> {
        let redirect_uri = options
            .authorization_params
            .redirect_uri
            .unwrap_or_else(|| self.location.origin());

        let code_verifier = pkce::generate_code_verifier();
        let code_challenge = pkce::generate_code_challenge(&code_verifier);
        let state = pkce::generate_state();

        let auth_url =
            pkce::build_authorization_url(&self.config, &redirect_uri, &code_challenge, &state);

        self.store_transaction(&LoginTransaction {
            state,
            code_verifier,
            redirect_uri,
        });

        tracing::trace!("Redirecting to Auth0: {}", auth_url);
        self.location.assign(&auth_url)?;
        Ok(())
    }

    async fn logout(&self, options: LogoutOptions) -> Result<(), ProviderError> {
        self.tokens.clear();
        self.storage.remove_item(TRANSACTION_STORAGE_KEY);

        let return_to = options
            .logout_params
            .return_to
            .unwrap_or_else(|| self.location.origin());
        let logout_url = format!(
            "{}?client_id={}&returnTo={}",
            self.config.logout_url(),
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&return_to)
        );

        tracing::trace!("Redirecting to Auth0 logout: {}", logout_url);
        self.location.assign(&logout_url)?;
        Ok(())
    }

    async fn get_id_token_claims(&self) -> Result<Option<ClaimSet>, ProviderError> {
        self.tokens
            .get()
            .map(|tokens| decode_claims(&tokens.id_token))
            .transpose()
    }

    async fn get_user(&self) -> Result<Option<User>, ProviderError> {
        self.tokens
            .get()
            .map(|tokens| decode_id_token_to_user(&tokens.id_token))
            .transpose()
    }

    async fn get_token_silently(&self) -> Result<Option<String>, ProviderError> {
        if let Some(tokens) = self.tokens.get() {
            return Ok(Some(tokens.access_token));
        }
        if self.tokens.get_any().is_none() {
            return Ok(None);
        }

        // One refresh at a time. Callers queued behind it see its result.
        let _refresh = self.refresh_lock.lock().await;

        let Some(tokens) = self.tokens.get_any() else {
            tracing::trace!("Session ended while waiting for a refresh");
            return Err(ProviderError::LoginRequired);
        };

        if tokens.is_valid() {
            return Ok(Some(tokens.access_token));
        }

        let Some(refresh_token) = tokens.refresh_token.clone() else {
            tracing::trace!("Access token expired and no refresh token, login required");
            self.tokens.clear();
            return Err(ProviderError::LoginRequired);
        };

        match self.refresh(tokens, &refresh_token).await {
            Ok(access_token) => Ok(Some(access_token)),
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                // Only drop the session this refresh started from.
                let current = self.tokens.get_any().and_then(|t| t.refresh_token);
                if current.as_deref() == Some(refresh_token.as_str()) {
                    self.tokens.clear();
                }
                Err(e)
            }
        }
    }

    async fn handle_redirect_callback(&self, url: &str) -> Result<(), ProviderError> {
        let url = Url::parse(url).map_err(|e| ProviderError::InvalidCallbackUrl(e.to_string()))?;
        let params: CallbackParams = serde_urlencoded::from_str(url.query().unwrap_or_default())
            .map_err(|e| ProviderError::InvalidCallbackUrl(e.to_string()))?;

        if let Some(error) = params.error {
            self.storage.remove_item(TRANSACTION_STORAGE_KEY);
            return Err(ProviderError::Authorization {
                error,
                description: params.error_description.unwrap_or_default(),
            });
        }

        let (Some(code), Some(state)) = (params.code, params.state) else {
            return Err(ProviderError::InvalidCallbackUrl(
                "missing code or state".to_string(),
            ));
        };

        let transaction = self.take_transaction().ok_or_else(|| {
            tracing::error!("No login transaction found for callback");
            ProviderError::InvalidState
        })?;

        if transaction.state != state {
            tracing::error!(
                "State mismatch - stored: {}, received: {}",
                transaction.state,
                state
            );
            return Err(ProviderError::InvalidState);
        }

        self.exchange_code(&code, &transaction).await
    }
}
