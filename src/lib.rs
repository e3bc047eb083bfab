//! # auth0-adapter
//!
//! Auth0 authentication for browser-hosted admin applications.
//!
//! A host application (an admin UI or dashboard) delegates authentication to a
//! pluggable [`AuthProvider`]: it asks whether the user is logged in on every
//! protected navigation, classifies failed API calls, and asks for the
//! current identity and permissions. This crate implements that contract on
//! top of Auth0's redirect login with PKCE, and ships a companion HTTP client
//! that attaches the Auth0 access token to every API request.
//!
//! ## Overview
//!
//! - **Shared types** (`Auth0Config`, `AuthProviderOptions`, `User`, `Identity`, `Permissions`)
//! - **Host contract** ([`AuthProvider`], [`AuthError`] with its [`Recovery`] hint)
//! - **Client module** - the [`Auth0AuthProvider`] adapter, the [`Auth0Client`]
//!   identity provider client, PKCE, token storage and the authenticated HTTP client
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auth0_adapter::{Auth0AuthProvider, Auth0Client, Auth0Config, AuthProvider, AuthProviderOptions};
//! use auth0_adapter::permissions::coarse_role;
//! use std::rc::Rc;
//!
//! let config = Auth0Config::new("your-tenant.auth0.com", "your_client_id")
//!     .with_audience("https://api.example.com");
//! let client = Rc::new(Auth0Client::for_window(config));
//!
//! let options = AuthProviderOptions::default().with_on_permissions(coarse_role);
//! let auth = Auth0AuthProvider::for_window(client, options);
//!
//! // On the login callback route:
//! if let Some(previous) = auth.handle_callback().await? {
//!     router.navigate(&previous);
//! }
//!
//! // On every protected route:
//! match auth.check_auth().await {
//!     Ok(()) => render(),
//!     Err(e) if e.allows_redirect() => router.navigate("/login"),
//!     Err(_) => {}
//! }
//! ```
//!
//! ## Platform Compatibility
//!
//! | Component | WASM (browser) | Native |
//! |-----------|----------------|--------|
//! | Adapter and Auth0 client | ✅ | ✅ |
//! | `WindowLocation` / `LocalStorage` | ✅ | ❌ |
//! | `MemoryLocation` / `MemoryStorage` | ✅ | ✅ |
//!
//! Everything is single-threaded: shared handles are `Rc` and async traits
//! are `?Send`, matching the browser's event loop.

pub mod auth_provider;
pub mod client;
pub mod config;
pub mod error;
pub mod permissions;
pub mod user;

pub use auth_provider::{ApiFailure, AuthProvider};
pub use client::{Auth0AuthProvider, Auth0Client, AuthenticatedHttpClient, IdentityProviderClient};
pub use config::{Auth0Config, AuthProviderOptions, CallbackCompletion, RoleClaimKey};
pub use error::{AuthError, BrowserError, ProviderError, Recovery};
pub use permissions::Permissions;
pub use user::{Identity, User};
