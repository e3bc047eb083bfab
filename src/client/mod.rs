//! Browser-side Auth0 integration.
//!
//! This module provides:
//! - The [`IdentityProviderClient`] contract and its Auth0 implementation
//! - The adapter exposing that client through the host's [`AuthProvider`](crate::AuthProvider) contract
//! - PKCE utilities and ID token decoding
//! - Token storage with a memory-first strategy
//! - An HTTP client that attaches the access token to API requests
//! - Location and storage capabilities, in memory or backed by `web-sys`
//!
//! # Example
//!
//! ```rust,ignore
//! use auth0_adapter::client::{Auth0AuthProvider, Auth0Client, AuthenticatedHttpClient};
//! use auth0_adapter::{Auth0Config, AuthProviderOptions};
//! use std::rc::Rc;
//!
//! let config = Auth0Config::from_env().expect("AUTH0_DOMAIN and AUTH0_CLIENT_ID");
//! let client = Rc::new(Auth0Client::for_window(config));
//!
//! let auth = Auth0AuthProvider::for_window(client.clone(), AuthProviderOptions::from_env());
//! let http = AuthenticatedHttpClient::new(client);
//! ```

pub mod adapter;
pub mod auth0;
pub mod browser;
pub mod callback;
pub mod http_client;
pub mod jwt;
pub mod pkce;
pub mod provider;
pub mod token_storage;

#[cfg(test)]
mod mock;

// Re-export commonly used types and functions
pub use adapter::{Auth0AuthProvider, PREVIOUS_LOCATION_STORAGE_KEY};
pub use auth0::{Auth0Client, TRANSACTION_STORAGE_KEY};
pub use browser::{Location, MemoryLocation, MemoryStorage, Storage};
#[cfg(target_arch = "wasm32")]
pub use browser::{LocalStorage, WindowLocation};
pub use callback::{CallbackContext, CallbackGuard};
pub use http_client::{AuthenticatedHttpClient, FetchError, HttpError, JsonResponse, auth0_headers};
pub use jwt::{decode_claims, decode_id_token_to_user};
pub use pkce::{generate_code_challenge, generate_code_verifier};
pub use provider::{
    AuthorizationParams, ClaimSet, IdentityProviderClient, LogoutOptions, LogoutParams,
    RedirectLoginOptions,
};
pub use token_storage::{StoredTokens, TOKENS_STORAGE_KEY, TokenStorage};
