//! Decoding of ID token payloads.
//!
//! The browser only reads what Auth0 asserted about the user; it does not
//! verify signatures. The token arrives directly from the token endpoint over
//! HTTPS and APIs validate access tokens on their side.

use crate::User;
use crate::client::provider::ClaimSet;
use crate::error::ProviderError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Decodes the payload of a JWT into its claims.
///
/// # Example
///
/// ```ignore
/// let claims = decode_claims(&id_token)?;
/// let roles = claims.get("https://example.com/roles");
/// ```
pub fn decode_claims(token: &str) -> Result<ClaimSet, ProviderError> {
    tracing::trace!("Decoding ID token claims");

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::error!("Invalid JWT format: expected 3 parts, got {}", parts.len());
        return Err(ProviderError::InvalidIdToken(
            "must have 3 parts separated by dots".to_string(),
        ));
    }

    let decoded = URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|e| ProviderError::InvalidIdToken(format!("Failed to decode base64: {}", e)))?;

    serde_json::from_slice(&decoded)
        .map_err(|e| ProviderError::InvalidIdToken(format!("Failed to parse JWT claims: {}", e)))
}

/// Decodes an ID token into the user profile it describes.
pub fn decode_id_token_to_user(token: &str) -> Result<User, ProviderError> {
    let claims = decode_claims(token)?;
    let user: User = serde_json::from_value(serde_json::Value::Object(claims))
        .map_err(|e| ProviderError::InvalidIdToken(format!("Missing user claims: {}", e)))?;

    tracing::trace!("Decoded user from ID token: sub={}", user.id);
    Ok(user)
}

#[cfg(test)]
pub(crate) fn encode_test_jwt(payload: &serde_json::Value) -> String {
    // Header and signature are never verified.
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
    format!("{}.{}.dummy_signature", header, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_claims_keeps_custom_claims() {
        let jwt = encode_test_jwt(&json!({
            "sub": "auth0|123456",
            "email": "test@example.com",
            "https://example.com/roles": ["admin", "user"],
            "exp": 1234571490
        }));

        let claims = decode_claims(&jwt).unwrap();
        assert_eq!(claims["sub"], "auth0|123456");
        assert_eq!(claims["https://example.com/roles"], json!(["admin", "user"]));
        assert_eq!(claims["exp"], 1234571490);
    }

    #[test]
    fn test_decode_claims_invalid_format() {
        let result = decode_claims("not.a.valid.jwt.format");
        assert!(result.unwrap_err().to_string().contains("must have 3 parts"));
    }

    #[test]
    fn test_decode_claims_invalid_base64() {
        assert!(decode_claims("header.!@#$%^&*().signature").is_err());
    }

    #[test]
    fn test_decode_claims_invalid_json() {
        let jwt = format!(
            "h.{}.s",
            URL_SAFE_NO_PAD.encode("not valid json".as_bytes())
        );
        let err = decode_claims(&jwt).unwrap_err();
        assert!(err.to_string().contains("Failed to parse JWT claims"));
    }

    #[test]
    fn test_decode_id_token_to_user() {
        let jwt = encode_test_jwt(&json!({
            "sub": "auth0|123456",
            "email": "test@example.com",
            "name": "Test User",
            "picture": "https://example.com/avatar.jpg"
        }));

        let user = decode_id_token_to_user(&jwt).unwrap();
        assert_eq!(user.id, "auth0|123456");
        assert_eq!(user.email.as_deref(), Some("test@example.com"));
        assert_eq!(user.name.as_deref(), Some("Test User"));
        assert_eq!(
            user.picture.as_deref(),
            Some("https://example.com/avatar.jpg")
        );
    }

    #[test]
    fn test_decode_id_token_without_subject() {
        let jwt = encode_test_jwt(&json!({"email": "test@example.com"}));
        assert!(decode_id_token_to_user(&jwt).is_err());
    }
}
