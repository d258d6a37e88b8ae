//! Gateway proxy for training resources.
//!
//! Every handler here forwards 1:1 to the downstream API gateway. User
//! scoped operations require a session and attach the caller's ID as a
//! header; the two enumeration endpoints are public pass-throughs.
//! Upstream bodies are never echoed into error responses.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::{AppState, RequireAuth};

/// Header carrying the authenticated caller's ID to the gateway.
pub const USER_ID_HEADER: &str = "X-User-ID";

/// Client for the downstream API gateway.
///
/// Holds one pooled `reqwest` client, shared by all requests for the
/// process lifetime.
#[derive(Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    /// Creates a gateway client for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to create gateway HTTP client");
                GatewayError::Unreachable
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Forwards a request to the gateway and maps its response.
    ///
    /// Success statuses pass the JSON body through; any other status maps
    /// to [`GatewayError::Upstream`] with the same code, and transport
    /// failures map to [`GatewayError::Unreachable`].
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        user_id: Option<&str>,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<(StatusCode, Value), GatewayError> {
        let mut request = self.http.request(method, format!("{}{path}", self.base_url));

        if let Some(id) = user_id {
            request = request.header(USER_ID_HEADER, id);
        }
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, path, "Gateway request failed");
            GatewayError::Unreachable
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), path, "Gateway returned an error");
            return Err(GatewayError::Upstream(status));
        }

        if status == StatusCode::NO_CONTENT {
            return Ok((status, Value::Null));
        }

        let body = response.json().await.map_err(|e| {
            tracing::error!(error = %e, path, "Gateway returned an unreadable body");
            GatewayError::Unreachable
        })?;

        Ok((status, body))
    }
}

/// Optional list filters, forwarded only when present.
#[derive(Debug, Default, Deserialize)]
pub struct TrainingFilters {
    #[serde(rename = "type")]
    kind: Option<String>,
    difficulty: Option<String>,
    search: Option<String>,
    #[serde(rename = "minDuration")]
    min_duration: Option<i64>,
    #[serde(rename = "maxDuration")]
    max_duration: Option<i64>,
}

impl TrainingFilters {
    /// Returns the query pairs to forward; absent filters are dropped.
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(kind) = &self.kind {
            query.push(("type", kind.clone()));
        }
        if let Some(difficulty) = &self.difficulty {
            query.push(("difficulty", difficulty.clone()));
        }
        if let Some(search) = &self.search {
            query.push(("search", search.clone()));
        }
        if let Some(min) = self.min_duration {
            query.push(("minDuration", min.to_string()));
        }
        if let Some(max) = self.max_duration {
            query.push(("maxDuration", max.to_string()));
        }
        query
    }
}

/// Lists trainings, with optional filters.
pub async fn list_trainings(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(filters): Query<TrainingFilters>,
) -> Result<Response, GatewayError> {
    let (status, body) = state
        .gateway
        .forward(
            Method::GET,
            "/api/trainings",
            Some(user.id()),
            &filters.to_query(),
            None,
        )
        .await?;

    Ok((status, Json(body)).into_response())
}

/// Creates a new training.
pub async fn create_training(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<Value>,
) -> Result<Response, GatewayError> {
    let (status, body) = state
        .gateway
        .forward(
            Method::POST,
            "/api/trainings",
            Some(user.id()),
            &[],
            Some(&body),
        )
        .await?;

    Ok((status, Json(body)).into_response())
}

/// Fetches a single training by ID.
pub async fn get_training(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Response, GatewayError> {
    let (status, body) = state
        .gateway
        .forward(
            Method::GET,
            &format!("/api/trainings/{id}"),
            Some(user.id()),
            &[],
            None,
        )
        .await?;

    Ok((status, Json(body)).into_response())
}

/// Updates a training.
pub async fn update_training(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, GatewayError> {
    let (status, body) = state
        .gateway
        .forward(
            Method::PUT,
            &format!("/api/trainings/{id}"),
            Some(user.id()),
            &[],
            Some(&body),
        )
        .await?;

    Ok((status, Json(body)).into_response())
}

/// Deletes a training.
///
/// The gateway answers 200 or 204; either way the browser gets a
/// synthesized confirmation body.
pub async fn delete_training(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Value>, GatewayError> {
    state
        .gateway
        .forward(
            Method::DELETE,
            &format!("/api/trainings/{id}"),
            Some(user.id()),
            &[],
            None,
        )
        .await?;

    Ok(Json(json!({"message": "Training deleted successfully"})))
}

/// Lists the available training types. No session required.
pub async fn training_types(State(state): State<AppState>) -> Result<Response, GatewayError> {
    let (status, body) = state
        .gateway
        .forward(Method::GET, "/api/trainings/types", None, &[], None)
        .await?;

    Ok((status, Json(body)).into_response())
}

/// Lists the available difficulty levels. No session required.
pub async fn training_difficulties(
    State(state): State<AppState>,
) -> Result<Response, GatewayError> {
    let (status, body) = state
        .gateway
        .forward(Method::GET, "/api/trainings/difficulties", None, &[], None)
        .await?;

    Ok((status, Json(body)).into_response())
}

/// Gateway proxy errors.
#[derive(Debug)]
pub enum GatewayError {
    /// The gateway could not be reached or answered unusably.
    Unreachable,
    /// The gateway answered with a non-success status.
    Upstream(StatusCode),
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreachable => write!(f, "failed to communicate with the API gateway"),
            Self::Upstream(status) => {
                write!(f, "API gateway returned HTTP {}", status.as_u16())
            }
        }
    }
}

impl std::error::Error for GatewayError {}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            Self::Unreachable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "Failed to communicate with API gateway"})),
            )
                .into_response(),
            Self::Upstream(status) => (
                status,
                Json(json!({"detail": "API gateway request failed"})),
            )
                .into_response(),
        }
    }
}
