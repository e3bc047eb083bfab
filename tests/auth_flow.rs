//! End-to-end login flow against a stand-in Auth0 tenant and API.

use auth0_adapter::client::{Location, MemoryLocation, MemoryStorage, Storage};
use auth0_adapter::permissions::coarse_role;
use auth0_adapter::{
    Auth0AuthProvider, Auth0Client, Auth0Config, AuthError, AuthProvider, AuthProviderOptions,
    AuthenticatedHttpClient, Permissions, Recovery,
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::Method;
use serde_json::json;
use std::rc::Rc;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn id_token() -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        json!({
            "sub": "auth0|42",
            "email": "jane@example.com",
            "name": "Jane Doe",
            "picture": "https://example.com/jane.png",
            "https://admin.example.com/roles": ["admin", "user"],
        })
        .to_string(),
    );
    format!("{}.{}.signature", header, payload)
}

fn query_param(url: &str, name: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

#[tokio::test]
async fn test_redirect_login_round_trip() {
    let tenant = MockServer::start().await;
    let api = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "api-token",
            "id_token": id_token(),
            "token_type": "Bearer",
            "expires_in": 86400
        })))
        .expect(1)
        .mount(&tenant)
        .await;

    Mock::given(method("GET"))
        .and(path("/posts"))
        .and(header("authorization", "Bearer api-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&api)
        .await;

    let location = Rc::new(MemoryLocation::new("http://localhost:8080/posts?page=2").unwrap());
    let storage = Rc::new(MemoryStorage::new());
    let config = Auth0Config::new(tenant.uri(), "spa-client").with_audience("https://api");
    let client = Rc::new(Auth0Client::new(config, location.clone(), storage.clone()));
    let auth = Auth0AuthProvider::new(
        client.clone(),
        location.clone(),
        storage.clone(),
        AuthProviderOptions::default().with_on_permissions(coarse_role),
    );

    // Protected page without a session: redirect to the tenant.
    let err = auth.check_auth().await.unwrap_err();
    assert_eq!(err.recovery(), Recovery::RedirectInProgress);
    assert_eq!(auth.get_permissions().await.unwrap(), Permissions::Denied);

    let authorize = location.last_navigation().unwrap();
    assert!(authorize.starts_with(&format!("{}/authorize?", tenant.uri())));
    assert_eq!(
        query_param(&authorize, "redirect_uri").as_deref(),
        Some("http://localhost:8080/login-callback")
    );
    let state = query_param(&authorize, "state").unwrap();

    // The tenant sends the browser back with a code.
    location
        .set_href(&format!(
            "http://localhost:8080/login-callback?code=auth-code-1&state={}",
            state
        ))
        .unwrap();

    let previous = auth.handle_callback().await.unwrap();
    assert_eq!(previous.as_deref(), Some("http://localhost:8080/posts?page=2"));
    assert_eq!(location.href(), "http://localhost:8080/login-callback");

    auth.check_auth().await.unwrap();
    assert_eq!(
        auth.get_permissions().await.unwrap(),
        Permissions::Role("admin".to_string())
    );

    let identity = auth.get_identity().await.unwrap();
    assert_eq!(identity.id, "jane@example.com");
    assert_eq!(identity.full_name.as_deref(), Some("Jane Doe"));

    // A second callback pass finds nothing to do.
    assert!(matches!(
        auth.handle_callback().await,
        Err(AuthError::NoPendingCallback)
    ));

    let http = AuthenticatedHttpClient::new(client.clone());
    let posts = http
        .fetch_json(Method::GET, &format!("{}/posts", api.uri()), None, None)
        .await
        .unwrap();
    assert_eq!(posts.json, Some(json!([{"id": 1}])));

    let return_to = auth.logout().await.unwrap();
    assert_eq!(return_to.as_deref(), Some("http://localhost:8080"));
    let logout = location.last_navigation().unwrap();
    assert!(logout.starts_with(&format!("{}/v2/logout?", tenant.uri())));
    assert!(storage.get_item("auth0_adapter.tokens").is_none());
    assert!(auth.check_auth().await.is_err());
}

#[tokio::test]
async fn test_forged_callback_is_not_retried() {
    let tenant = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&tenant)
        .await;

    let location = Rc::new(
        MemoryLocation::new("http://localhost:8080/login-callback?code=stolen&state=forged")
            .unwrap(),
    );
    let storage = Rc::new(MemoryStorage::new());
    let client = Rc::new(Auth0Client::new(
        Auth0Config::new(tenant.uri(), "spa-client"),
        location.clone(),
        storage.clone(),
    ));
    let auth = Auth0AuthProvider::new(client, location.clone(), storage, AuthProviderOptions::default());

    let err = auth.handle_callback().await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to handle login callback: Invalid state");
    assert!(!err.allows_redirect());
    assert!(location.navigations().is_empty());

    assert!(matches!(
        auth.handle_callback().await,
        Err(AuthError::NoPendingCallback)
    ));
}
