//! Shared harness for integration tests.
//!
//! Spins up the full router against wiremock stand-ins for the identity
//! provider and the API gateway. Cookies are persisted across requests so
//! the code flow works the way a browser would drive it.

// Each test binary uses a different subset of the harness.
#![allow(dead_code)]

use axum_test::TestServer;
use serde_json::json;
use training_bff_identity::KeycloakConfig;
use training_bff_server::{
    app,
    auth::{AppState, ProviderClient},
    config::{ServerConfig, SessionConfig},
    trainings::GatewayClient,
};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const REALM: &str = "training-app";
pub const FRONTEND_URL: &str = "http://localhost:3000";
pub const TOKEN_PATH: &str = "/realms/training-app/protocol/openid-connect/token";
pub const USERINFO_PATH: &str = "/realms/training-app/protocol/openid-connect/userinfo";
pub const DISCOVERY_PATH: &str = "/realms/training-app/.well-known/openid-configuration";

pub fn test_config(provider_url: &str, gateway_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 8080,
        secret_key: "integration-test-secret-key-0123456789".to_string(),
        session: SessionConfig::default(),
        keycloak: KeycloakConfig::new(
            "training-app".to_string(),
            "s3cr3t".to_string(),
            provider_url.to_string(),
            REALM.to_string(),
        ),
        api_gateway_url: gateway_url.to_string(),
        frontend_url: FRONTEND_URL.to_string(),
    }
}

pub fn test_server(config: ServerConfig) -> TestServer {
    let provider = ProviderClient::new(config.keycloak.clone(), config.redirect_uri())
        .expect("provider client");
    let gateway = GatewayClient::new(&config.api_gateway_url).expect("gateway client");
    let router = app::router(AppState::new(config, provider, gateway));

    TestServer::builder()
        .save_cookies()
        .build(router)
        .expect("test server")
}

/// A token response with the userinfo claims embedded, as newer Keycloak
/// releases send them.
pub fn token_response_with_userinfo() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": "test-access-token",
        "token_type": "Bearer",
        "expires_in": 300,
        "id_token": "test-id-token",
        "userinfo": {
            "sub": "u1",
            "preferred_username": "bob",
            "email": "bob@example.com",
            "name": "Bob Example",
        },
    }))
}

/// Stubs the provider's token endpoint for one successful exchange.
pub async fn mount_token_endpoint(provider: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(token_response_with_userinfo())
        .mount(provider)
        .await;
}

/// Extracts the `state` parameter from a login redirect Location header.
pub fn state_param(location: &str) -> String {
    let url = Url::parse(location).expect("location is a URL");
    url.query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .expect("state parameter present")
}

/// Drives the whole login flow: login redirect, then callback with the
/// code and the state the redirect carried.
pub async fn login(server: &TestServer) {
    let response = server.get("/api/auth/login").await;
    assert!(response.status_code().is_redirection());

    let location = response.header("location");
    let state = state_param(location.to_str().expect("location header"));

    let response = server
        .get("/api/auth/callback")
        .add_query_param("code", "test-code")
        .add_query_param("state", state)
        .await;
    assert!(response.status_code().is_redirection());
}
