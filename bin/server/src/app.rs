//! Router assembly.

use axum::{
    Json,
    http::{HeaderValue, Method, header},
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{self, AppState};
use crate::trainings;

/// Builds the full application router.
///
/// The CORS layer allows only the configured frontend origin, with
/// credentials, so the browser can carry the session cookie on API calls.
pub fn router(state: AppState) -> axum::Router {
    let frontend_origin = state
        .config
        .frontend_url
        .parse::<HeaderValue>()
        .expect("frontend URL is a valid header value");

    let cors = CorsLayer::new()
        .allow_origin(frontend_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    axum::Router::new()
        .route("/", get(service_banner))
        .route("/health", get(service_health))
        .route("/api/auth/login", get(auth::login))
        .route("/api/auth/callback", get(auth::callback))
        .route("/api/auth/status", get(auth::status))
        .route("/api/auth/logout", get(auth::logout).post(auth::logout))
        .route("/api/auth/health", get(auth::health))
        .route("/api/auth/success", get(auth::routes::success))
        .route("/api/auth/logout-success", get(auth::routes::logout_success))
        .route("/api/auth/failure", get(auth::routes::failure))
        // Legacy paths kept for frontends wired to the old server.
        .route("/oauth2/authorization/keycloak", get(auth::login))
        .route("/login/oauth2/code/keycloak", get(auth::callback))
        .route(
            "/api/trainings",
            get(trainings::list_trainings).post(trainings::create_training),
        )
        .route("/api/trainings/types", get(trainings::training_types))
        .route(
            "/api/trainings/difficulties",
            get(trainings::training_difficulties),
        )
        .route(
            "/api/trainings/{id}",
            get(trainings::get_training)
                .put(trainings::update_training)
                .delete(trainings::delete_training),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Root banner, useful for a quick liveness poke from a browser.
async fn service_banner() -> impl IntoResponse {
    Json(json!({
        "message": "Training App BFF",
        "status": "running",
    }))
}

/// Process-level health, independent of the identity provider.
async fn service_health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "training-bff",
    }))
}
