//! Identity provider client built on the `oauth2` crate.
//!
//! The provider's endpoint URLs come straight from [`KeycloakConfig`]
//! instead of OIDC discovery, so constructing the client never touches the
//! network. One instance is built at startup and shared by every request;
//! the embedded `reqwest` client pools its connections across calls.

use std::time::Duration;

use oauth2::basic::{
    BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
    BasicTokenType,
};
use oauth2::{
    AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, ExtraTokenFields, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope,
    StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};
use training_bff_identity::{KeycloakConfig, UserinfoClaims};
use url::Url;

/// Timeout for token and userinfo calls.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for the discovery-document health probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Token response fields beyond the OAuth2 core set.
///
/// Keycloak returns the ID token alongside the access token; some
/// deployments also embed the userinfo claims directly, saving the
/// follow-up userinfo call.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeycloakTokenFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    userinfo: Option<UserinfoClaims>,
}

impl ExtraTokenFields for KeycloakTokenFields {}

type KeycloakTokenResponse = StandardTokenResponse<KeycloakTokenFields, BasicTokenType>;

type OAuthClient = Client<
    BasicErrorResponse,
    KeycloakTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Client for the identity provider's OAuth2/OIDC endpoints.
pub struct ProviderClient {
    config: KeycloakConfig,
    redirect_uri: String,
    http: reqwest::Client,
}

/// State issued alongside the authorization redirect, held in a cookie
/// until the callback returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthState {
    pub csrf_token: String,
    pub pkce_verifier: String,
}

/// Tokens returned by a successful code exchange.
#[derive(Debug)]
pub struct TokenBundle {
    pub access_token: String,
    pub id_token: Option<String>,
    pub userinfo: Option<UserinfoClaims>,
}

/// Outcome of the discovery-document health probe.
#[derive(Debug)]
pub enum HealthProbe {
    /// The provider served its discovery document.
    Connected,
    /// The provider answered with a non-success status.
    Unreachable(u16),
    /// The provider could not be reached at all.
    Error(String),
}

impl ProviderClient {
    /// Creates a new provider client.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured endpoint or redirect URLs do not
    /// parse, or if the HTTP client cannot be constructed.
    pub fn new(config: KeycloakConfig, redirect_uri: String) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("failed to create HTTP client: {e}"))
            })?;

        let client = Self {
            config,
            redirect_uri,
            http,
        };
        // Surface bad URLs now instead of on the first login.
        client.oauth_client()?;

        Ok(client)
    }

    /// Returns the provider configuration.
    #[must_use]
    pub fn config(&self) -> &KeycloakConfig {
        &self.config
    }

    fn oauth_client(&self) -> Result<OAuthClient, ProviderError> {
        let auth_url = AuthUrl::new(self.config.authorize_url())
            .map_err(|e| ProviderError::Configuration(format!("invalid authorize URL: {e}")))?;
        let token_url = TokenUrl::new(self.config.token_url())
            .map_err(|e| ProviderError::Configuration(format!("invalid token URL: {e}")))?;
        let redirect_url = RedirectUrl::new(self.redirect_uri.clone())
            .map_err(|e| ProviderError::Configuration(format!("invalid redirect URI: {e}")))?;

        Ok(
            Client::new(ClientId::new(self.config.client_id().to_string()))
                .set_client_secret(ClientSecret::new(self.config.client_secret().to_string()))
                .set_auth_uri(auth_url)
                .set_token_uri(token_url)
                .set_redirect_uri(redirect_url),
        )
    }

    /// Builds the authorization redirect for the login flow.
    ///
    /// The URL carries `client_id`, `redirect_uri`, `response_type=code`,
    /// `response_mode=query`, the configured scopes, a random `state`, and
    /// a PKCE challenge. No side effects; the caller issues the redirect
    /// and stores the returned [`AuthState`].
    pub fn authorization_redirect(&self) -> Result<(Url, AuthState), ProviderError> {
        let client = self.oauth_client()?;

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut request = client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge)
            .add_extra_param("response_mode", "query");

        for scope in self.config.scopes() {
            request = request.add_scope(Scope::new(scope.to_string()));
        }

        let (auth_url, csrf_token) = request.url();

        let state = AuthState {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        };

        Ok((auth_url, state))
    }

    /// Exchanges the authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::TokenExchange`] if the token endpoint
    /// answers with a non-success status or cannot be reached.
    pub async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<TokenBundle, ProviderError> {
        let client = self.oauth_client()?;

        let token = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| ProviderError::TokenExchange(e.to_string()))?;

        Ok(TokenBundle {
            access_token: token.access_token().secret().clone(),
            id_token: token.extra_fields().id_token.clone(),
            userinfo: token.extra_fields().userinfo.clone(),
        })
    }

    /// Fetches userinfo claims with a bearer token.
    ///
    /// Needed only when the token response did not embed the claims.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Userinfo`] on a non-200 answer or an
    /// unparsable body, and [`ProviderError::Unreachable`] on network
    /// failure.
    pub async fn fetch_userinfo(&self, access_token: &str) -> Result<UserinfoClaims, ProviderError> {
        let response = self
            .http
            .get(self.config.userinfo_url())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Userinfo(format!(
                "userinfo endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        response
            .json::<UserinfoClaims>()
            .await
            .map_err(|e| ProviderError::Userinfo(format!("invalid userinfo body: {e}")))
    }

    /// Builds the end-session redirect for logout.
    ///
    /// When `id_token` is absent the hint parameter is omitted; the
    /// provider may then keep its own session alive, but logout still
    /// proceeds.
    pub fn end_session_redirect(
        &self,
        id_token: Option<&str>,
        post_logout_uri: &str,
    ) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.config.end_session_url())
            .map_err(|e| ProviderError::Configuration(format!("invalid end-session URL: {e}")))?;

        {
            let mut pairs = url.query_pairs_mut();
            if let Some(hint) = id_token {
                pairs.append_pair("id_token_hint", hint);
            }
            pairs.append_pair("post_logout_redirect_uri", post_logout_uri);
        }

        Ok(url)
    }

    /// Probes the provider's discovery document.
    ///
    /// Uses a short timeout so the health endpoint answers promptly even
    /// when the provider is down.
    pub async fn probe(&self) -> HealthProbe {
        let result = self
            .http
            .get(self.config.discovery_url())
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => HealthProbe::Connected,
            Ok(response) => HealthProbe::Unreachable(response.status().as_u16()),
            Err(e) => HealthProbe::Error(e.to_string()),
        }
    }
}

/// Identity provider errors.
#[derive(Debug)]
pub enum ProviderError {
    /// Configuration error (invalid URLs, unusable HTTP client).
    Configuration(String),
    /// The code exchange failed.
    TokenExchange(String),
    /// The userinfo call failed.
    Userinfo(String),
    /// The provider could not be reached.
    Unreachable(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "provider configuration error: {msg}"),
            Self::TokenExchange(msg) => write!(f, "token exchange error: {msg}"),
            Self::Userinfo(msg) => write!(f, "userinfo error: {msg}"),
            Self::Unreachable(msg) => write!(f, "provider unreachable: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_client() -> ProviderClient {
        let config = KeycloakConfig::new(
            "training-app".to_string(),
            "s3cr3t".to_string(),
            "http://localhost:8180".to_string(),
            "training-app".to_string(),
        );
        ProviderClient::new(
            config,
            "http://localhost:8080/login/oauth2/code/keycloak".to_string(),
        )
        .expect("provider client")
    }

    fn query_map(url: &Url) -> HashMap<String, String> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn authorization_redirect_carries_code_flow_parameters() {
        let client = test_client();
        let (url, state) = client.authorization_redirect().expect("redirect");

        assert!(url.as_str().starts_with(
            "http://localhost:8180/realms/training-app/protocol/openid-connect/auth"
        ));

        let query = query_map(&url);
        assert_eq!(query["client_id"], "training-app");
        assert_eq!(
            query["redirect_uri"],
            "http://localhost:8080/login/oauth2/code/keycloak"
        );
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["response_mode"], "query");
        assert_eq!(query["scope"], "openid profile email");
        assert_eq!(query["state"], state.csrf_token);
        assert_eq!(query["code_challenge_method"], "S256");
        assert!(!query["code_challenge"].is_empty());
        assert!(!state.pkce_verifier.is_empty());
    }

    #[test]
    fn authorization_redirects_use_distinct_state() {
        let client = test_client();
        let (_, first) = client.authorization_redirect().expect("redirect");
        let (_, second) = client.authorization_redirect().expect("redirect");
        assert_ne!(first.csrf_token, second.csrf_token);
    }

    #[test]
    fn end_session_redirect_includes_hint_when_present() {
        let client = test_client();
        let url = client
            .end_session_redirect(Some("the-id-token"), "http://localhost:3000?logout=success")
            .expect("end session URL");

        let query = query_map(&url);
        assert_eq!(query["id_token_hint"], "the-id-token");
        assert_eq!(
            query["post_logout_redirect_uri"],
            "http://localhost:3000?logout=success"
        );
    }

    #[test]
    fn end_session_redirect_omits_hint_when_absent() {
        let client = test_client();
        let url = client
            .end_session_redirect(None, "http://localhost:3000?logout=success")
            .expect("end session URL");

        let query = query_map(&url);
        assert!(!query.contains_key("id_token_hint"));
        assert_eq!(
            query["post_logout_redirect_uri"],
            "http://localhost:3000?logout=success"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected_at_construction() {
        let config = KeycloakConfig::new(
            "training-app".to_string(),
            "s3cr3t".to_string(),
            "not a url".to_string(),
            "training-app".to_string(),
        );
        let result = ProviderClient::new(config, "http://localhost:8080/callback".to_string());
        assert!(matches!(result, Err(ProviderError::Configuration(_))));
    }
}
