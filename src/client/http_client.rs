//! Authentication-aware HTTP client.
//!
//! Every outgoing request asks the identity provider client for an access
//! token and carries it as `Authorization: Bearer <token>`. Headers set by the
//! caller are kept. Without a token the request goes out unchanged and the API
//! decides; a failure to obtain a token rejects the request before it is sent.

use crate::auth_provider::ApiFailure;
use crate::client::provider::IdentityProviderClient;
use crate::error::ProviderError;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, Request, Response};
use serde_json::Value;
use std::rc::Rc;

/// Headers for a request to an Auth0-protected API.
///
/// Caller headers are kept as they are; without any a fresh map accepting
/// JSON is used. A token, when present, is added as a bearer credential.
///
/// # Example
///
/// ```
/// # use auth0_adapter::client::http_client::auth0_headers;
/// let headers = auth0_headers(Some("abc"), None);
/// assert_eq!(headers["authorization"], "Bearer abc");
/// assert_eq!(headers["accept"], "application/json");
/// ```
pub fn auth0_headers(token: Option<&str>, headers: Option<HeaderMap>) -> HeaderMap {
    let mut headers = headers.unwrap_or_else(|| {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    });

    match token.filter(|t| !t.is_empty()) {
        Some(token) => match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                headers.insert(AUTHORIZATION, value);
                tracing::trace!("Added Authorization header to request");
            }
            Err(_) => tracing::warn!("Failed to create Authorization header from token"),
        },
        None => {
            tracing::trace!("No access token available - request goes out unauthenticated")
        }
    }
    headers
}

/// Non-2xx response from the API.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct HttpError {
    pub status: u16,
    /// `message` field of the JSON body, or the status reason.
    pub message: String,
    pub json: Option<Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// No token could be obtained; the request was not sent.
    #[error("Failed to obtain access token: {0}")]
    Token(#[source] ProviderError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiFailure for FetchError {
    fn status(&self) -> Option<u16> {
        match self {
            // A session that cannot produce a token is as good as a 401.
            FetchError::Token(_) => Some(401),
            FetchError::Http(e) => Some(e.status),
            FetchError::Transport(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

/// Successful response of [`AuthenticatedHttpClient::fetch_json`].
#[derive(Debug, Clone)]
pub struct JsonResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
    /// Parsed body, `None` when it is not JSON.
    pub json: Option<Value>,
}

/// HTTP client that authorizes every request with the identity provider's token.
pub struct AuthenticatedHttpClient<C> {
    client: Rc<C>,
    http: reqwest::Client,
}

impl<C: IdentityProviderClient> AuthenticatedHttpClient<C> {
    pub fn new(client: Rc<C>) -> Self {
        Self::with_http_client(client, reqwest::Client::new())
    }

    pub fn with_http_client(client: Rc<C>, http: reqwest::Client) -> Self {
        Self { client, http }
    }

    /// Adds the bearer credential to `request`.
    pub async fn authorize(&self, mut request: Request) -> Result<Request, FetchError> {
        let token = self.client.get_token_silently().await.map_err(|e| {
            tracing::warn!("Rejecting request to {}: {}", request.url(), e);
            FetchError::Token(e)
        })?;

        let caller_headers = std::mem::take(request.headers_mut());
        let caller_headers = (!caller_headers.is_empty()).then_some(caller_headers);
        *request.headers_mut() = auth0_headers(token.as_deref(), caller_headers);
        Ok(request)
    }

    /// Authorizes and sends `request`.
    pub async fn execute(&self, request: Request) -> Result<Response, FetchError> {
        let request = self.authorize(request).await?;
        Ok(self.http.execute(request).await?)
    }

    /// Sends an authorized request with an optional JSON body and reads the
    /// response as JSON. Non-2xx statuses become [`FetchError::Http`].
    pub async fn fetch_json(
        &self,
        method: Method,
        url: &str,
        headers: Option<HeaderMap>,
        body: Option<&Value>,
    ) -> Result<JsonResponse, FetchError> {
        let mut builder = self.http.request(method, url);
        if let Some(headers) = headers {
            builder = builder.headers(headers);
        }

        let mut request = self.authorize(builder.build()?).await?;
        if let Some(body) = body {
            if !request.headers().contains_key(CONTENT_TYPE) {
                request
                    .headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            *request.body_mut() = Some(body.to_string().into());
        }

        let response = self.http.execute(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;
        let json = serde_json::from_str::<Value>(&body).ok();

        if !status.is_success() {
            let message = json
                .as_ref()
                .and_then(|j| j.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
            tracing::trace!("API answered {}: {}", status, message);
            return Err(HttpError {
                status: status.as_u16(),
                message,
                json,
            }
            .into());
        }

        Ok(JsonResponse {
            status: status.as_u16(),
            headers,
            body,
            json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth_provider::AuthProvider;
    use crate::client::adapter::Auth0AuthProvider;
    use crate::client::browser::{MemoryLocation, MemoryStorage};
    use crate::client::mock::MockIdentityProvider;
    use crate::config::AuthProviderOptions;
    use crate::error::AuthError;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_with_token(token: Option<&str>) -> AuthenticatedHttpClient<MockIdentityProvider> {
        let mock = MockIdentityProvider::authenticated();
        *mock.token.borrow_mut() = token.map(str::to_string);
        AuthenticatedHttpClient::new(Rc::new(mock))
    }

    fn custom_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("X-Custom", HeaderValue::from_static("1"));
        headers
    }

    #[test]
    fn test_auth0_headers_keeps_caller_headers() {
        let headers = auth0_headers(Some("abc"), Some(custom_headers()));

        assert_eq!(headers["x-custom"], "1");
        assert_eq!(headers[AUTHORIZATION], "Bearer abc");
        assert!(!headers.contains_key(ACCEPT));
    }

    #[test]
    fn test_auth0_headers_defaults_to_json() {
        let headers = auth0_headers(None, None);
        assert_eq!(headers[ACCEPT], "application/json");
        assert!(!headers.contains_key(AUTHORIZATION));
    }

    #[test]
    fn test_auth0_headers_without_token_leaves_headers() {
        let headers = auth0_headers(None, Some(custom_headers()));
        assert_eq!(headers, custom_headers());
    }

    #[test]
    fn test_fetch_error_status() {
        assert_eq!(FetchError::Token(ProviderError::LoginRequired).status(), Some(401));
        let http = HttpError {
            status: 503,
            message: "Service Unavailable".to_string(),
            json: None,
        };
        assert_eq!(FetchError::Http(http).status(), Some(503));
    }

    #[tokio::test]
    async fn test_fetch_json_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts"))
            .and(header("authorization", "Bearer abc"))
            .and(header("x-custom", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_with_token(Some("abc"))
            .fetch_json(
                Method::GET,
                &format!("{}/posts", server.uri()),
                Some(custom_headers()),
                None,
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.json, Some(json!([{"id": 1}])));
    }

    #[tokio::test]
    async fn test_fetch_json_posts_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/posts"))
            .and(header("content-type", "application/json"))
            .and(header("accept", "application/json"))
            .and(body_json(json!({"title": "Hello"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7})))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_with_token(Some("abc"))
            .fetch_json(
                Method::POST,
                &format!("{}/posts", server.uri()),
                None,
                Some(&json!({"title": "Hello"})),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(response.json.unwrap()["id"], 7);
    }

    #[tokio::test]
    async fn test_request_without_token_goes_out_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        client_with_token(None)
            .fetch_json(Method::GET, &format!("{}/posts", server.uri()), None, None)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn test_token_failure_rejects_without_sending() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mock = MockIdentityProvider::authenticated();
        mock.token_error.set(true);
        let client = AuthenticatedHttpClient::new(Rc::new(mock));

        let err = client
            .fetch_json(Method::GET, &format!("{}/posts", server.uri()), None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Token(ProviderError::LoginRequired)));
    }

    #[tokio::test]
    async fn test_execute_authorizes_raw_request() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/posts/1"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let request = reqwest::Client::new()
            .delete(format!("{}/posts/1", server.uri()))
            .build()
            .unwrap();
        let response = client_with_token(Some("abc")).execute(request).await.unwrap();
        assert_eq!(response.status().as_u16(), 204);
    }

    #[tokio::test]
    async fn test_unauthorized_response_feeds_check_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/posts"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"message": "Token expired"})),
            )
            .mount(&server)
            .await;

        let err = client_with_token(Some("stale"))
            .fetch_json(Method::GET, &format!("{}/posts", server.uri()), None, None)
            .await
            .unwrap_err();

        match &err {
            FetchError::Http(e) => {
                assert_eq!(e.status, 401);
                assert_eq!(e.message, "Token expired");
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let provider = Auth0AuthProvider::new(
            Rc::new(MockIdentityProvider::authenticated()),
            Rc::new(MemoryLocation::new("http://localhost:8080/").unwrap()),
            Rc::new(MemoryStorage::new()),
            AuthProviderOptions::default(),
        );
        assert!(matches!(
            provider.check_error(&err),
            Err(AuthError::Unauthorized {
                redirect_in_progress: false
            })
        ));
    }

    #[tokio::test]
    async fn test_server_error_uses_status_reason() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_with_token(Some("abc"))
            .fetch_json(Method::GET, &format!("{}/posts", server.uri()), None, None)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Internal Server Error");
        assert_eq!(err.status(), Some(500));
    }
}
