//! Error types shared by the adapter, the Auth0 client and the header injector.
//!
//! The adapter's job is to classify and label failures, never to render them.
//! Every [`AuthError`] therefore carries a [`Recovery`] hint telling the host
//! what to do next.

/// What the host should do after a capability call failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recovery {
    /// Send the user through login again (or block the navigation).
    Reauthenticate,
    /// A login redirect is already underway; the host has nothing left to do.
    RedirectInProgress,
    /// Surface the message and stay put. Redirecting again would loop.
    DoNotRedirect,
    /// Sequencing error in the caller; there is nothing to recover.
    None,
}

/// Failure talking to the browser (navigation, history).
#[derive(Debug, thiserror::Error)]
#[error("Browser operation failed: {0}")]
pub struct BrowserError(pub String);

/// Errors raised by an identity provider client.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ProviderError {
    /// No usable session; the user has to log in interactively.
    #[error("Login required")]
    LoginRequired,

    /// The callback state does not match a login transaction started here.
    #[error("Invalid state")]
    InvalidState,

    /// The callback URL could not be interpreted.
    #[error("Invalid callback URL: {0}")]
    InvalidCallbackUrl(String),

    /// The authorization server redirected back with an error.
    #[error("{error}: {description}")]
    Authorization { error: String, description: String },

    /// The token endpoint rejected the request.
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// The stored ID token could not be decoded.
    #[error("Invalid ID token: {0}")]
    InvalidIdToken(String),

    /// Transport failure.
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

/// Errors returned by the host-facing capabilities.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuthError {
    /// No session, or the API answered 401/403.
    #[error("Unauthorized")]
    Unauthorized {
        /// True when `check_auth` already started the login redirect.
        redirect_in_progress: bool,
    },

    /// Code and state were present but the token exchange failed.
    #[error("Failed to handle login callback: {message}")]
    CallbackFailure { message: String },

    /// Identity requested without an authenticated session.
    #[error("Failed to get identity.")]
    IdentityUnavailable,

    /// `handle_callback` was called without a pending callback in the location.
    #[error("Failed to handle login callback: no pending callback")]
    NoPendingCallback,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

impl AuthError {
    /// Recovery hint for the host.
    pub fn recovery(&self) -> Recovery {
        match self {
            AuthError::Unauthorized {
                redirect_in_progress: true,
            } => Recovery::RedirectInProgress,
            AuthError::Unauthorized {
                redirect_in_progress: false,
            } => Recovery::Reauthenticate,
            AuthError::CallbackFailure { .. } => Recovery::DoNotRedirect,
            AuthError::Provider(ProviderError::LoginRequired) => Recovery::Reauthenticate,
            AuthError::IdentityUnavailable
            | AuthError::NoPendingCallback
            | AuthError::Provider(_)
            | AuthError::Browser(_) => Recovery::None,
        }
    }

    /// Whether the host may start another login redirect in response.
    pub fn allows_redirect(&self) -> bool {
        self.recovery() == Recovery::Reauthenticate
    }
}
