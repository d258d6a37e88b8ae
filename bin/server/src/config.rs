//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.
//!
//! See [`KeycloakConfig`](training_bff_identity::KeycloakConfig) for the
//! identity provider configuration.

use serde::Deserialize;
use training_bff_identity::KeycloakConfig;

/// Server configuration composed from library configs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Secret used to derive the session cookie encryption key.
    #[serde(default = "default_secret_key")]
    pub secret_key: String,

    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Identity provider configuration.
    #[serde(default)]
    pub keycloak: KeycloakConfig,

    /// Base URL of the downstream API gateway.
    #[serde(default = "default_api_gateway_url")]
    pub api_gateway_url: String,

    /// Base URL of the browser frontend.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session duration in minutes. Expiry is enforced by the cookie
    /// Max-Age; there is no server-side session state to reap.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to false for local HTTP development.
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_secret_key() -> String {
    "your-secret-key-change-in-production".to_string()
}

fn default_session_duration_minutes() -> i64 {
    60
}

fn default_api_gateway_url() -> String {
    "http://localhost:8082".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_session_duration_minutes(),
            secure_cookies: false,
        }
    }
}

/// The secret key must be long enough to derive a cookie encryption key.
const MIN_SECRET_KEY_BYTES: usize = 32;

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Nested fields use `__` as the separator, e.g. `KEYCLOAK__CLIENT_ID`
    /// or `SESSION__DURATION_MINUTES`.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment contains values that fail to
    /// parse into the expected types.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Validates the loaded configuration.
    ///
    /// Misconfiguration is rejected here, at startup, rather than surfacing
    /// as a failed login later.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret key is too short or the identity
    /// provider configuration is incomplete.
    pub fn validate(&self) -> Result<(), ServerConfigError> {
        if self.secret_key.len() < MIN_SECRET_KEY_BYTES {
            return Err(ServerConfigError::WeakSecretKey {
                minimum: MIN_SECRET_KEY_BYTES,
            });
        }
        self.keycloak.validate().map_err(ServerConfigError::Identity)
    }

    /// Returns the OAuth2 redirect URI for the authorization code callback.
    ///
    /// Uses the legacy `/login/oauth2/code/keycloak` path so the client
    /// registration of the framework being replaced keeps working.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/login/oauth2/code/keycloak", self.port)
    }

    /// Returns the URI the provider redirects to after logout.
    #[must_use]
    pub fn post_logout_redirect_uri(&self) -> String {
        format!("{}?logout=success", self.frontend_url)
    }
}

/// Server configuration errors.
#[derive(Debug)]
pub enum ServerConfigError {
    /// The session secret is too short to derive a cookie key from.
    WeakSecretKey { minimum: usize },
    /// The identity provider configuration is incomplete.
    Identity(training_bff_identity::ConfigError),
}

impl std::fmt::Display for ServerConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WeakSecretKey { minimum } => {
                write!(f, "SECRET_KEY must be at least {minimum} bytes")
            }
            Self::Identity(e) => write!(f, "identity provider configuration: {e}"),
        }
    }
}

impl std::error::Error for ServerConfigError {}
