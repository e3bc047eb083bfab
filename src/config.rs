//! Configuration for the Auth0 client and the authentication adapter.
//!
//! [`Auth0Config`] describes the Auth0 tenant and application. It is plain
//! data and can be serialized. [`AuthProviderOptions`] tunes the adapter's
//! behaviour: redirect targets, whether `check_auth` redirects on its own,
//! how the role claim is found and how it is turned into permissions.

use crate::permissions::Permissions;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::rc::Rc;

/// Scope requested when none is configured.
pub const DEFAULT_SCOPE: &str = "openid profile email";

/// Application-relative path the identity provider redirects back to by default.
pub const DEFAULT_LOGIN_CALLBACK_PATH: &str = "/login-callback";

/// Auth0 tenant and application settings.
///
/// # Fields
///
/// - `domain`: Auth0 tenant domain (e.g., "your-tenant.auth0.com")
/// - `client_id`: public identifier of the single page application
/// - `audience`: API identifier; without it Auth0 issues opaque access tokens
/// - `scope`: scopes requested at login
/// - `use_refresh_tokens`: request `offline_access` and refresh silently
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Auth0Config {
    pub domain: String,

    pub client_id: String,

    #[serde(default)]
    pub audience: Option<String>,

    #[serde(default = "default_scope")]
    pub scope: String,

    #[serde(default)]
    pub use_refresh_tokens: bool,
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

impl Auth0Config {
    /// Creates a configuration with the default scope and no audience.
    ///
    /// # Example
    ///
    /// ```
    /// # use auth0_adapter::Auth0Config;
    /// let config = Auth0Config::new("your-tenant.auth0.com", "your_client_id")
    ///     .with_audience("https://api.example.com");
    /// assert_eq!(config.audience.as_deref(), Some("https://api.example.com"));
    /// ```
    pub fn new(domain: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            client_id: client_id.into(),
            audience: None,
            scope: default_scope(),
            use_refresh_tokens: false,
        }
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_refresh_tokens(mut self, enabled: bool) -> Self {
        self.use_refresh_tokens = enabled;
        self
    }

    /// Loads the configuration from compile-time environment variables.
    ///
    /// Expected environment variables:
    /// - `AUTH0_DOMAIN` - Auth0 tenant domain
    /// - `AUTH0_CLIENT_ID` - Auth0 application client ID
    /// - `AUTH0_AUDIENCE` - Auth0 API audience (optional)
    ///
    /// Returns `None` if a required variable was not set at compile time.
    pub fn from_env() -> Option<Self> {
        let domain = option_env!("AUTH0_DOMAIN")?;
        let client_id = option_env!("AUTH0_CLIENT_ID")?;

        let mut config = Self::new(domain, client_id);
        config.audience = option_env!("AUTH0_AUDIENCE")
            .filter(|a| !a.is_empty())
            .map(str::to_string);
        Some(config)
    }

    /// Scope actually sent to the authorization server.
    pub fn effective_scope(&self) -> String {
        if self.use_refresh_tokens && !self.scope.split(' ').any(|s| s == "offline_access") {
            format!("{} offline_access", self.scope)
        } else {
            self.scope.clone()
        }
    }

    /// Base URL for Auth0 endpoints.
    ///
    /// A domain that already carries a scheme is used as is, which allows
    /// pointing the client at a local stand-in for the tenant.
    ///
    /// # Example
    ///
    /// ```
    /// # use auth0_adapter::Auth0Config;
    /// let config = Auth0Config::new("test.auth0.com", "client");
    /// assert_eq!(config.base_url(), "https://test.auth0.com");
    /// ```
    pub fn base_url(&self) -> String {
        if self.domain.starts_with("http://") || self.domain.starts_with("https://") {
            self.domain.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", self.domain)
        }
    }

    pub fn authorize_url(&self) -> String {
        format!("{}/authorize", self.base_url())
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.base_url())
    }

    pub fn logout_url(&self) -> String {
        format!("{}/v2/logout", self.base_url())
    }
}

/// How the key of the role claim is found among the ID token claims.
///
/// Auth0 only lets custom claims through when they are namespaced, so roles
/// usually arrive under a key such as `https://example.com/roles`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleClaimKey {
    /// The claim with exactly this key.
    Exact(String),
    /// The first claim whose key starts with this prefix.
    Prefix(String),
    /// The first claim whose last `/`-separated segment is one of these names.
    Namespaced(Vec<String>),
}

impl Default for RoleClaimKey {
    fn default() -> Self {
        RoleClaimKey::Namespaced(vec!["role".to_string(), "roles".to_string()])
    }
}

impl RoleClaimKey {
    /// Returns true if `key` names the role claim.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            RoleClaimKey::Exact(exact) => key == exact,
            RoleClaimKey::Prefix(prefix) => key.starts_with(prefix.as_str()),
            RoleClaimKey::Namespaced(names) => {
                let segment = key.rsplit('/').next().unwrap_or(key);
                names.iter().any(|n| n == segment)
            }
        }
    }

    /// Finds the role claim. Keys are visited in map order.
    pub fn resolve<'a>(&self, claims: &'a Map<String, Value>) -> Option<(&'a str, &'a Value)> {
        claims
            .iter()
            .find(|(key, _)| self.matches(key))
            .map(|(key, value)| (key.as_str(), value))
    }
}

/// How a processed login callback is removed from the location.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallbackCompletion {
    /// Rewrite the URL without its query string and fragment.
    #[default]
    ReplaceState,
    /// Reload the page so every in-memory identity is rebuilt.
    Reload,
}

/// Post-processing applied to the raw role claim by `get_permissions`.
pub type PermissionsMapper = Rc<dyn Fn(Permissions) -> Permissions>;

/// Options captured by the adapter at construction.
#[derive(Clone)]
pub struct AuthProviderOptions {
    /// Callback URL handed to the identity provider at login.
    /// Defaults to `{origin}/login-callback`.
    pub login_redirect_uri: Option<String>,
    /// Where the identity provider sends the user after logout. Defaults to the origin.
    pub logout_redirect_uri: Option<String>,
    /// When false, `check_auth` never redirects and leaves login to the host.
    pub redirect_on_check_auth: bool,
    pub role_claim: RoleClaimKey,
    pub on_permissions: Option<PermissionsMapper>,
    pub callback_completion: CallbackCompletion,
}

impl Default for AuthProviderOptions {
    fn default() -> Self {
        Self {
            login_redirect_uri: None,
            logout_redirect_uri: None,
            redirect_on_check_auth: true,
            role_claim: RoleClaimKey::default(),
            on_permissions: None,
            callback_completion: CallbackCompletion::default(),
        }
    }
}

impl fmt::Debug for AuthProviderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthProviderOptions")
            .field("login_redirect_uri", &self.login_redirect_uri)
            .field("logout_redirect_uri", &self.logout_redirect_uri)
            .field("redirect_on_check_auth", &self.redirect_on_check_auth)
            .field("role_claim", &self.role_claim)
            .field("on_permissions", &self.on_permissions.is_some())
            .field("callback_completion", &self.callback_completion)
            .finish()
    }
}

impl AuthProviderOptions {
    /// Loads redirect URLs from compile-time environment variables
    /// (`AUTH0_LOGIN_REDIRECT_URL`, `AUTH0_LOGOUT_REDIRECT_URL`). Unset or
    /// empty variables keep the defaults.
    pub fn from_env() -> Self {
        let non_empty = |v: Option<&'static str>| v.filter(|s| !s.is_empty()).map(str::to_string);
        Self {
            login_redirect_uri: non_empty(option_env!("AUTH0_LOGIN_REDIRECT_URL")),
            logout_redirect_uri: non_empty(option_env!("AUTH0_LOGOUT_REDIRECT_URL")),
            ..Self::default()
        }
    }

    pub fn with_login_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.login_redirect_uri = Some(uri.into());
        self
    }

    pub fn with_logout_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.logout_redirect_uri = Some(uri.into());
        self
    }

    pub fn with_redirect_on_check_auth(mut self, enabled: bool) -> Self {
        self.redirect_on_check_auth = enabled;
        self
    }

    pub fn with_role_claim(mut self, key: RoleClaimKey) -> Self {
        self.role_claim = key;
        self
    }

    pub fn with_on_permissions<F>(mut self, f: F) -> Self
    where
        F: Fn(Permissions) -> Permissions + 'static,
    {
        self.on_permissions = Some(Rc::new(f));
        self
    }

    pub fn with_callback_completion(mut self, completion: CallbackCompletion) -> Self {
        self.callback_completion = completion;
        self
    }
}
