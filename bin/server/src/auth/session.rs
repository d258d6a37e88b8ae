//! Cookie-backed session storage.
//!
//! The session lives entirely in an encrypted browser cookie; there is no
//! server-side session table. The encrypted payload carries its own expiry
//! instant, checked on every read, so a replayed cookie dies with the
//! session even if the browser ignores Max-Age. Concurrent requests from
//! one browser resolve by last-write-wins on the cookie value. A cookie
//! that fails decryption or JSON parsing is treated as no session at all.

use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use training_bff_identity::SessionUser;

use super::provider::AuthState;

/// Session cookie name.
pub const SESSION_COOKIE: &str = "bff_session";

/// Auth state cookie name (CSRF/PKCE state during the code flow).
pub const AUTH_STATE_COOKIE: &str = "auth_state";

/// How long the auth-state cookie survives while the browser is away at
/// the provider.
const AUTH_STATE_MINUTES: i64 = 10;

/// The encrypted cookie payload: the user plus the expiry instant.
#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    user: SessionUser,
    /// Unix timestamp past which the session is dead, whatever the
    /// browser did with Max-Age.
    expires_at: i64,
}

/// Reads the session user from the jar, if a valid, unexpired session
/// cookie exists.
#[must_use]
pub fn read_session(jar: &PrivateCookieJar) -> Option<SessionUser> {
    let cookie = jar.get(SESSION_COOKIE)?;
    let record: SessionRecord = match serde_json::from_str(cookie.value()) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(error = %e, "Discarding malformed session cookie");
            return None;
        }
    };

    if OffsetDateTime::now_utc().unix_timestamp() >= record.expires_at {
        tracing::debug!("Discarding expired session cookie");
        return None;
    }

    Some(record.user)
}

/// Writes the session user into the jar.
///
/// The record is complete by construction ([`SessionUser::from_claims`]),
/// so nothing partial can land in the cookie.
#[must_use]
pub fn write_session(
    jar: PrivateCookieJar,
    user: &SessionUser,
    duration_minutes: i64,
    secure: bool,
) -> PrivateCookieJar {
    let record = SessionRecord {
        user: user.clone(),
        expires_at: (OffsetDateTime::now_utc() + Duration::minutes(duration_minutes))
            .unix_timestamp(),
    };
    let value = serde_json::to_string(&record).expect("serialize session record");

    let cookie = Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::minutes(duration_minutes));

    jar.add(cookie)
}

/// Removes the session cookie.
#[must_use]
pub fn clear_session(jar: PrivateCookieJar) -> PrivateCookieJar {
    let removal = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(Duration::ZERO);

    jar.add(removal)
}

/// Stores the auth state issued with the authorization redirect.
#[must_use]
pub fn store_auth_state(jar: PrivateCookieJar, state: &AuthState, secure: bool) -> PrivateCookieJar {
    let value = serde_json::to_string(state).expect("serialize auth state");

    let cookie = Cookie::build((AUTH_STATE_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::minutes(AUTH_STATE_MINUTES));

    jar.add(cookie)
}

/// Takes the auth state out of the jar, removing its cookie.
///
/// The state is single-use; it is dropped whether or not the callback
/// succeeds.
#[must_use]
pub fn take_auth_state(jar: PrivateCookieJar) -> (PrivateCookieJar, Option<AuthState>) {
    let state = jar
        .get(AUTH_STATE_COOKIE)
        .and_then(|cookie| serde_json::from_str(cookie.value()).ok());

    let removal = Cookie::build((AUTH_STATE_COOKIE, ""))
        .path("/")
        .max_age(Duration::ZERO);

    (jar.add(removal), state)
}
