//! Authentication routes: login, callback, status, logout, health.
//!
//! The callback path never answers with a server error; every failure is
//! absorbed into a redirect back to the frontend with an `error` marker so
//! the browser always lands somewhere usable. Logout clears the local
//! session before anything else, so a dead provider can never trap a user
//! in an authenticated-looking state.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use serde_json::{Value, json};
use training_bff_identity::SessionUser;

use super::AppState;
use super::provider::{AuthState, HealthProbe, ProviderError};
use super::session;

/// Query parameters for the OIDC callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Initiates the login flow by redirecting to the identity provider.
///
/// Responds 503 when the redirect cannot be built from the configured
/// provider endpoints.
pub async fn login(State(state): State<AppState>, jar: PrivateCookieJar) -> Response {
    let (auth_url, auth_state) = match state.provider.authorization_redirect() {
        Ok(redirect) => redirect,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build authorization redirect");
            return provider_unavailable(state.config.keycloak.base_url());
        }
    };

    tracing::debug!(redirect_uri = %state.config.redirect_uri(), "Redirecting to provider login");

    let jar = session::store_auth_state(jar, &auth_state, state.config.session.secure_cookies);
    (jar, Redirect::to(auth_url.as_str())).into_response()
}

/// Handles the authorization code callback from the identity provider.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: PrivateCookieJar,
) -> Response {
    let (jar, auth_state) = session::take_auth_state(jar);

    match complete_callback(&state, &query, auth_state).await {
        Ok(user) => {
            tracing::info!(username = user.username().unwrap_or("unknown"), "User logged in");

            let jar = session::write_session(
                jar,
                &user,
                state.config.session.duration_minutes,
                state.config.session.secure_cookies,
            );
            let dashboard = format!("{}/dashboard", state.config.frontend_url);
            (jar, Redirect::to(&dashboard)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "OAuth callback failed");
            let failure = format!("{}?error=auth_failed", state.config.frontend_url);
            (jar, Redirect::to(&failure)).into_response()
        }
    }
}

/// Runs the fallible part of the callback: state validation, code
/// exchange, and userinfo resolution.
async fn complete_callback(
    state: &AppState,
    query: &CallbackQuery,
    auth_state: Option<AuthState>,
) -> Result<SessionUser, CallbackError> {
    if let Some(error) = &query.error {
        return Err(CallbackError::ProviderDenied(error.clone()));
    }

    let code = query.code.as_deref().ok_or(CallbackError::MissingCode)?;
    let returned_state = query.state.as_deref().ok_or(CallbackError::MissingState)?;
    let auth_state = auth_state.ok_or(CallbackError::MissingAuthState)?;

    if returned_state != auth_state.csrf_token {
        return Err(CallbackError::CsrfMismatch);
    }

    let tokens = state
        .provider
        .exchange_code(code, &auth_state.pkce_verifier)
        .await?;

    // Some providers embed the claims in the token response; fall back to
    // the userinfo endpoint when they don't.
    let claims = match tokens.userinfo {
        Some(claims) => claims,
        None => state.provider.fetch_userinfo(&tokens.access_token).await?,
    };

    Ok(SessionUser::from_claims(
        claims,
        tokens.access_token,
        tokens.id_token,
    ))
}

/// Reports the authentication status of the current browser session.
///
/// Tokens are never part of this response.
pub async fn status(super::CurrentUser(user): super::CurrentUser) -> Json<Value> {
    match user {
        Some(user) => Json(json!({
            "authenticated": true,
            "user": user.public(),
        })),
        None => Json(json!({"authenticated": false})),
    }
}

/// Logs out the user.
///
/// The session cookie is removed first and unconditionally; the provider
/// redirect is best-effort on top of that. Calling logout without a
/// session succeeds the same way.
pub async fn logout(State(state): State<AppState>, jar: PrivateCookieJar) -> Response {
    let user = session::read_session(&jar);
    let jar = session::clear_session(jar);

    let username = user
        .as_ref()
        .and_then(SessionUser::username)
        .unwrap_or("unknown");
    let id_token = user.as_ref().and_then(SessionUser::id_token);

    match id_token {
        Some(_) => tracing::info!(username, "User logged out with id_token hint"),
        None => tracing::warn!(username, "User logged out without id_token hint"),
    }

    let post_logout = state.config.post_logout_redirect_uri();
    let target = match state.provider.end_session_redirect(id_token, &post_logout) {
        Ok(url) => url.to_string(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build end-session redirect, using fallback");
            post_logout
        }
    };

    (jar, Redirect::to(&target)).into_response()
}

/// Probes the identity provider and reports connectivity.
///
/// Always answers 200; the body carries the verdict.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let keycloak = &state.config.keycloak;

    let body = match state.provider.probe().await {
        HealthProbe::Connected => json!({
            "status": "healthy",
            "keycloak": "connected",
            "realm": keycloak.realm(),
            "base_url": keycloak.base_url(),
        }),
        HealthProbe::Unreachable(code) => json!({
            "status": "degraded",
            "keycloak": "unreachable",
            "error": format!("HTTP {code}"),
            "base_url": keycloak.base_url(),
        }),
        HealthProbe::Error(e) => json!({
            "status": "unhealthy",
            "keycloak": "error",
            "error": e,
            "base_url": keycloak.base_url(),
        }),
    };

    Json(body)
}

/// Legacy login-success endpoint; sends the browser to the dashboard.
pub async fn success(State(state): State<AppState>) -> Redirect {
    Redirect::to(&format!("{}/dashboard", state.config.frontend_url))
}

/// Confirms a completed logout.
pub async fn logout_success() -> Json<Value> {
    Json(json!({"message": "Logout completed"}))
}

/// Legacy login-failure endpoint.
pub async fn failure() -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({"message": "Login failed"})))
}

fn provider_unavailable(base_url: &str) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "detail": format!(
                "Authentication service unavailable. Please ensure Keycloak is running on {base_url}"
            ),
        })),
    )
        .into_response()
}

/// Callback failures; all of them resolve to the same error redirect.
#[derive(Debug)]
enum CallbackError {
    ProviderDenied(String),
    MissingCode,
    MissingState,
    MissingAuthState,
    CsrfMismatch,
    Provider(ProviderError),
}

impl std::fmt::Display for CallbackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProviderDenied(error) => write!(f, "provider returned error '{error}'"),
            Self::MissingCode => write!(f, "callback without authorization code"),
            Self::MissingState => write!(f, "callback without state parameter"),
            Self::MissingAuthState => write!(f, "no auth state cookie for this callback"),
            Self::CsrfMismatch => write!(f, "state parameter does not match auth state"),
            Self::Provider(e) => write!(f, "{e}"),
        }
    }
}

impl From<ProviderError> for CallbackError {
    fn from(e: ProviderError) -> Self {
        Self::Provider(e)
    }
}
