//! Session user record and provider claims.
//!
//! The `SessionUser` is the record written to the browser session after a
//! successful authorization code exchange. It is constructed only from a
//! complete set of provider claims plus tokens, so a partially populated
//! record can never reach the session store.

use serde::{Deserialize, Serialize};

/// Claims returned by the identity provider's userinfo endpoint (or embedded
/// in the token response).
///
/// Only the claims the BFF consumes are modeled; unknown claims are ignored.
/// `sub` is the one claim that must be present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserinfoClaims {
    /// The subject claim, the provider's stable user identifier.
    sub: String,
    /// The user's preferred login name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    preferred_username: Option<String>,
    /// The user's email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    /// The user's display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl UserinfoClaims {
    /// Creates claims with only the required subject.
    #[must_use]
    pub fn new(sub: String) -> Self {
        Self {
            sub,
            preferred_username: None,
            email: None,
            name: None,
        }
    }

    /// Sets the preferred username.
    #[must_use]
    pub fn with_preferred_username(mut self, username: Option<String>) -> Self {
        self.preferred_username = username;
        self
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Returns the subject claim.
    #[must_use]
    pub fn sub(&self) -> &str {
        &self.sub
    }
}

/// The authenticated user record stored in the session.
///
/// Holds both the identity fields exposed to the frontend and the tokens
/// needed for logout (`id_token`) and downstream calls (`access_token`).
/// Tokens never leave the server; responses use [`PublicUser`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// The provider's subject claim.
    id: String,
    /// The user's preferred login name.
    username: Option<String>,
    /// The user's email address.
    email: Option<String>,
    /// The user's display name.
    name: Option<String>,
    /// OIDC access token from the code exchange.
    access_token: String,
    /// OIDC ID token, used as the end-session hint on logout.
    id_token: Option<String>,
}

impl SessionUser {
    /// Builds the session record from provider claims and tokens.
    #[must_use]
    pub fn from_claims(
        claims: UserinfoClaims,
        access_token: String,
        id_token: Option<String>,
    ) -> Self {
        Self {
            id: claims.sub,
            username: claims.preferred_username,
            email: claims.email,
            name: claims.name,
            access_token,
            id_token,
        }
    }

    /// Returns the user's identifier (the provider subject).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the user's preferred login name, if available.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the user's email address, if available.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the user's display name, if available.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the OIDC access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Returns the OIDC ID token, if the provider issued one.
    #[must_use]
    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_deref()
    }

    /// Returns the token-free view for status responses.
    #[must_use]
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// The token-free user view returned by the auth status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    /// The provider's subject claim.
    pub id: String,
    /// The user's preferred login name.
    pub username: Option<String>,
    /// The user's email address.
    pub email: Option<String>,
    /// The user's display name.
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_claims() -> UserinfoClaims {
        UserinfoClaims::new("u1".to_string())
            .with_preferred_username(Some("bob".to_string()))
            .with_email(Some("bob@example.com".to_string()))
            .with_name(Some("Bob Example".to_string()))
    }

    #[test]
    fn session_user_copies_all_claims() {
        let user = SessionUser::from_claims(
            test_claims(),
            "access-token".to_string(),
            Some("id-token".to_string()),
        );

        assert_eq!(user.id(), "u1");
        assert_eq!(user.username(), Some("bob"));
        assert_eq!(user.email(), Some("bob@example.com"));
        assert_eq!(user.name(), Some("Bob Example"));
        assert_eq!(user.access_token(), "access-token");
        assert_eq!(user.id_token(), Some("id-token"));
    }

    #[test]
    fn public_view_carries_no_tokens() {
        let user = SessionUser::from_claims(
            test_claims(),
            "access-token".to_string(),
            Some("id-token".to_string()),
        );

        let json = serde_json::to_value(user.public()).expect("serialize");
        assert_eq!(json["id"], "u1");
        assert_eq!(json["username"], "bob");
        assert!(json.get("access_token").is_none());
        assert!(json.get("id_token").is_none());
    }

    #[test]
    fn claims_deserialize_with_missing_optionals() {
        let claims: UserinfoClaims =
            serde_json::from_str(r#"{"sub": "u2", "azp": "ignored"}"#).expect("deserialize");

        assert_eq!(claims.sub(), "u2");
        let user = SessionUser::from_claims(claims, "t".to_string(), None);
        assert_eq!(user.id(), "u2");
        assert_eq!(user.username(), None);
    }

    #[test]
    fn claims_without_subject_are_rejected() {
        let result = serde_json::from_str::<UserinfoClaims>(r#"{"email": "bob@example.com"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn session_user_roundtrips_through_json() {
        let user = SessionUser::from_claims(test_claims(), "t".to_string(), None);

        let json = serde_json::to_string(&user).expect("serialize");
        let parsed: SessionUser = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(user, parsed);
    }

    #[test]
    fn session_user_without_id_fails_to_deserialize() {
        let result =
            serde_json::from_str::<SessionUser>(r#"{"username": "bob", "access_token": "t"}"#);
        assert!(result.is_err());
    }
}
