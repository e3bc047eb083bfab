//! PKCE (Proof Key for Code Exchange) utilities for the authorization code flow,
//! as specified in RFC 7636.

use crate::Auth0Config;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of the code verifier in bytes (43-128 characters recommended by RFC 7636)
const CODE_VERIFIER_LENGTH: usize = 32;

const STATE_LENGTH: usize = 16;

fn random_url_safe(len: usize) -> String {
    let random_bytes: Vec<u8> = rand::thread_rng()
        .sample_iter(rand::distributions::Standard)
        .take(len)
        .collect();

    URL_SAFE_NO_PAD.encode(&random_bytes)
}

/// Generates a cryptographically random code verifier.
pub fn generate_code_verifier() -> String {
    random_url_safe(CODE_VERIFIER_LENGTH)
}

/// Derives the S256 code challenge: base64url(SHA256(verifier)).
pub fn generate_code_challenge(code_verifier: &str) -> String {
    let hash = Sha256::digest(code_verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generates a random state parameter for CSRF protection.
pub fn generate_state() -> String {
    random_url_safe(STATE_LENGTH)
}

/// Builds the `/authorize` URL the browser is sent to.
///
/// The audience is only added when configured; without it Auth0 issues an
/// opaque access token that APIs cannot validate locally.
pub fn build_authorization_url(
    config: &Auth0Config,
    redirect_uri: &str,
    code_challenge: &str,
    state: &str,
) -> String {
    let mut url = format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&code_challenge={}&code_challenge_method=S256&state={}",
        config.authorize_url(),
        urlencoding::encode(&config.client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&config.effective_scope()),
        urlencoding::encode(code_challenge),
        urlencoding::encode(state),
    );

    if let Some(audience) = config.audience.as_deref().filter(|a| !a.is_empty()) {
        url.push_str("&audience=");
        url.push_str(&urlencoding::encode(audience));
    }
    url
}
