//! Identity provider configuration.
//!
//! This module provides the configuration for connecting to a Keycloak-style
//! OIDC identity provider. The provider's endpoint URLs are derived from the
//! base URL and realm rather than discovered, matching the fixed
//! `{base}/realms/{realm}/protocol/openid-connect/*` layout.

use serde::{Deserialize, Serialize};

/// Configuration for the Keycloak identity provider.
///
/// Fields with defaults can be omitted when loading from environment
/// variables. The defaults target a local development provider; the client
/// secret has no usable default and must be supplied (see [`validate`]).
///
/// [`validate`]: KeycloakConfig::validate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeycloakConfig {
    /// The OAuth2 client ID registered with the provider.
    #[serde(default = "default_client_id")]
    client_id: String,
    /// The OAuth2 client secret. Empty means unconfigured.
    #[serde(default)]
    client_secret: String,
    /// Base URL of the provider (e.g. "http://localhost:8180").
    #[serde(default = "default_base_url")]
    base_url: String,
    /// The realm hosting the client registration.
    #[serde(default = "default_realm")]
    realm: String,
    /// OAuth2 scopes to request as a comma-separated string.
    /// Default: "openid,profile,email"
    #[serde(default = "default_scopes")]
    scopes: String,
}

fn default_client_id() -> String {
    "training-app".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8180".to_string()
}

fn default_realm() -> String {
    "training-app".to_string()
}

fn default_scopes() -> String {
    "openid,profile,email".to_string()
}

impl Default for KeycloakConfig {
    fn default() -> Self {
        Self {
            client_id: default_client_id(),
            client_secret: String::new(),
            base_url: default_base_url(),
            realm: default_realm(),
            scopes: default_scopes(),
        }
    }
}

impl KeycloakConfig {
    /// Creates a new configuration with default scopes.
    #[must_use]
    pub fn new(client_id: String, client_secret: String, base_url: String, realm: String) -> Self {
        Self {
            client_id,
            client_secret,
            base_url,
            realm,
            scopes: default_scopes(),
        }
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the provider base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the realm name.
    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Returns the OAuth2 scopes to request, parsed from the
    /// comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes.split(',').map(str::trim).collect()
    }

    /// Returns the authorization endpoint URL.
    #[must_use]
    pub fn authorize_url(&self) -> String {
        format!("{}/protocol/openid-connect/auth", self.realm_url())
    }

    /// Returns the token endpoint URL.
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/protocol/openid-connect/token", self.realm_url())
    }

    /// Returns the userinfo endpoint URL.
    #[must_use]
    pub fn userinfo_url(&self) -> String {
        format!("{}/protocol/openid-connect/userinfo", self.realm_url())
    }

    /// Returns the end-session (logout) endpoint URL.
    #[must_use]
    pub fn end_session_url(&self) -> String {
        format!("{}/protocol/openid-connect/logout", self.realm_url())
    }

    /// Returns the URL of the provider's OIDC discovery document.
    #[must_use]
    pub fn discovery_url(&self) -> String {
        format!("{}/.well-known/openid-configuration", self.realm_url())
    }

    fn realm_url(&self) -> String {
        format!("{}/realms/{}", self.base_url.trim_end_matches('/'), self.realm)
    }

    /// Validates the configuration.
    ///
    /// A confidential-client code exchange cannot work without a secret, so
    /// an empty secret is rejected here instead of failing at the token
    /// endpoint on the first login.
    ///
    /// # Errors
    ///
    /// Returns an error if the client ID, client secret, base URL, or realm
    /// is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.is_empty() {
            return Err(ConfigError::MissingClientId);
        }
        if self.client_secret.is_empty() {
            return Err(ConfigError::MissingClientSecret);
        }
        if self.base_url.is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        if self.realm.is_empty() {
            return Err(ConfigError::MissingRealm);
        }
        Ok(())
    }
}

/// Identity configuration errors.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// No OAuth2 client ID configured.
    MissingClientId,
    /// No OAuth2 client secret configured.
    MissingClientSecret,
    /// No provider base URL configured.
    MissingBaseUrl,
    /// No realm configured.
    MissingRealm,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingClientId => write!(f, "KEYCLOAK__CLIENT_ID must not be empty"),
            Self::MissingClientSecret => write!(f, "KEYCLOAK__CLIENT_SECRET must not be empty"),
            Self::MissingBaseUrl => write!(f, "KEYCLOAK__BASE_URL must not be empty"),
            Self::MissingRealm => write!(f, "KEYCLOAK__REALM must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {}
