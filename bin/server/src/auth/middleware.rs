//! Authentication extractors for Axum.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Key, PrivateCookieJar};
use serde_json::json;
use training_bff_identity::SessionUser;

use super::session;

/// Extractor for requiring an authenticated user.
///
/// Rejects the request with 401 before any downstream call is made. A
/// missing, expired, or undecipherable session cookie all land here.
pub struct RequireAuth(pub SessionUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    Key: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthRejection::Internal)?;

        let user = session::read_session(&jar).ok_or(AuthRejection::NotAuthenticated)?;

        Ok(RequireAuth(user))
    }
}

/// Extractor for optionally getting the authenticated user.
///
/// Never rejects; anonymous requests yield `None`.
pub struct CurrentUser(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for CurrentUser
where
    Key: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match RequireAuth::from_request_parts(parts, state).await {
            Ok(RequireAuth(user)) => Ok(CurrentUser(Some(user))),
            Err(_) => Ok(CurrentUser(None)),
        }
    }
}

/// Rejection type for authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    NotAuthenticated,
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAuthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Authentication required"})),
            )
                .into_response(),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "Internal server error"})),
            )
                .into_response(),
        }
    }
}
