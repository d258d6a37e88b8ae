//! Authentication module for the training BFF.
//!
//! This module provides:
//! - The OAuth2 authorization code flow against the identity provider
//! - Encrypted-cookie session management (no server-side session state)
//! - Authentication extractors for Axum routes
//!
//! The session holds the full user record, tokens included; protected
//! routes read it through [`RequireAuth`] and the gateway proxy forwards
//! only the user's ID downstream.

pub mod middleware;
pub mod provider;
pub mod routes;
pub mod session;

pub use middleware::{AuthRejection, CurrentUser, RequireAuth};
pub use provider::{ProviderClient, ProviderError};
pub use routes::{callback, health, login, logout, status};

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use crate::config::ServerConfig;
use crate::trainings::GatewayClient;

/// Shared application state.
///
/// Cheap to clone; the provider and gateway clients are shared across all
/// in-flight requests and are constructed exactly once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Identity provider client.
    pub provider: Arc<ProviderClient>,
    /// Downstream API gateway client.
    pub gateway: GatewayClient,
    /// Key for the encrypted session cookies.
    cookie_key: Key,
}

impl AppState {
    /// Creates the application state.
    ///
    /// The secret key length is checked by `ServerConfig::validate`
    /// before this runs, so the key derivation cannot panic.
    #[must_use]
    pub fn new(config: ServerConfig, provider: ProviderClient, gateway: GatewayClient) -> Self {
        let cookie_key = Key::derive_from(config.secret_key.as_bytes());
        Self {
            config: Arc::new(config),
            provider: Arc::new(provider),
            gateway,
            cookie_key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
