//! Token storage with a memory-first strategy.
//!
//! 1. **Primary (memory)**: the tokens the client works with during a page's lifetime
//! 2. **Secondary ([`Storage`])**: a persisted copy so a reload keeps the session
//!
//! ## Storage Strategy
//!
//! - On login: store in both memory and storage
//! - On page load: restore from storage into memory
//! - On logout or failed refresh: clear both
//! - During a session: always read from memory

use crate::client::browser::Storage;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Storage key for the persisted token set.
pub const TOKENS_STORAGE_KEY: &str = "auth0_adapter.tokens";

/// Tokens kept for the current session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StoredTokens {
    /// Access token (JWT for API calls)
    pub access_token: String,
    /// ID token (JWT with user claims)
    pub id_token: String,
    /// Present when the login requested `offline_access`
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix timestamp when the access token expires (in seconds)
    pub expires_at: u64,
}

impl StoredTokens {
    /// Creates new StoredTokens with expiration calculated from expires_in seconds.
    pub fn new(access_token: String, id_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            id_token,
            refresh_token: None,
            expires_at: current_timestamp() + expires_in,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: Option<String>) -> Self {
        self.refresh_token = refresh_token;
        self
    }

    pub fn is_expired(&self) -> bool {
        current_timestamp() >= self.expires_at
    }

    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }
}

/// Memory-first token store persisting to a [`Storage`].
pub struct TokenStorage {
    tokens: RefCell<Option<StoredTokens>>,
    storage: Rc<dyn Storage>,
}

impl TokenStorage {
    pub fn new(storage: Rc<dyn Storage>) -> Self {
        Self {
            tokens: RefCell::new(None),
            storage,
        }
    }

    /// Restores the previous session from storage.
    ///
    /// Expired tokens are kept when they carry a refresh token, since they can
    /// still be renewed; otherwise they are discarded. Returns true if tokens
    /// were restored.
    pub fn initialize(&self) -> bool {
        tracing::trace!("Initializing token storage");

        let Some(raw) = self.storage.get_item(TOKENS_STORAGE_KEY) else {
            tracing::trace!("No persisted tokens found");
            return false;
        };

        match serde_json::from_str::<StoredTokens>(&raw) {
            Ok(tokens) if tokens.is_valid() || tokens.refresh_token.is_some() => {
                tracing::trace!(
                    "Restored tokens, expires in {} seconds",
                    tokens.expires_at.saturating_sub(current_timestamp())
                );
                *self.tokens.borrow_mut() = Some(tokens);
                true
            }
            Ok(_) => {
                tracing::warn!("Persisted tokens are expired, clearing");
                self.storage.remove_item(TOKENS_STORAGE_KEY);
                false
            }
            Err(e) => {
                tracing::warn!("Persisted tokens are unreadable, clearing: {}", e);
                self.storage.remove_item(TOKENS_STORAGE_KEY);
                false
            }
        }
    }

    /// Stores tokens in both memory and storage.
    pub fn store(&self, tokens: StoredTokens) {
        tracing::trace!("Storing tokens in memory and storage");

        match serde_json::to_string(&tokens) {
            Ok(json) => self.storage.set_item(TOKENS_STORAGE_KEY, &json),
            Err(e) => tracing::warn!("Failed to serialize tokens: {}", e),
        }
        *self.tokens.borrow_mut() = Some(tokens);
    }

    /// Unexpired tokens from memory.
    pub fn get(&self) -> Option<StoredTokens> {
        let tokens = self.tokens.borrow().clone()?;

        if tokens.is_valid() {
            Some(tokens)
        } else {
            tracing::trace!("Tokens in memory are expired");
            None
        }
    }

    /// Tokens from memory whether expired or not.
    pub fn get_any(&self) -> Option<StoredTokens> {
        self.tokens.borrow().clone()
    }

    pub fn get_access_token(&self) -> Option<String> {
        self.get().map(|t| t.access_token)
    }

    pub fn has_valid_tokens(&self) -> bool {
        self.get().is_some()
    }

    /// Clears tokens from both memory and storage.
    pub fn clear(&self) {
        tracing::trace!("Clearing tokens from memory and storage");
        *self.tokens.borrow_mut() = None;
        self.storage.remove_item(TOKENS_STORAGE_KEY);
    }
}

/// Returns current Unix timestamp in seconds.
pub(crate) fn current_timestamp() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        (js_sys::Date::now() / 1000.0) as u64
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
