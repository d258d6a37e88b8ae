//! Identity types for the training BFF.
//!
//! This crate provides:
//! - Identity provider configuration (`KeycloakConfig`) with the derived
//!   endpoint URLs for the authorization code flow
//! - The session user record (`SessionUser`) written to the browser session
//!   after a successful login, and its token-free public view (`PublicUser`)
//! - The userinfo claims (`UserinfoClaims`) returned by the provider
//!
//! # Example
//!
//! ```
//! use training_bff_identity::{KeycloakConfig, SessionUser, UserinfoClaims};
//!
//! let config = KeycloakConfig::new(
//!     "training-app".to_string(),
//!     "s3cr3t".to_string(),
//!     "http://localhost:8180".to_string(),
//!     "training-app".to_string(),
//! );
//! assert_eq!(
//!     config.token_url(),
//!     "http://localhost:8180/realms/training-app/protocol/openid-connect/token",
//! );
//!
//! let claims = UserinfoClaims::new("u1".to_string());
//! let user = SessionUser::from_claims(claims, "access".to_string(), None);
//! assert_eq!(user.id(), "u1");
//! ```

pub mod config;
pub mod user;

// Re-export main types at crate root
pub use config::{ConfigError, KeycloakConfig};
pub use user::{PublicUser, SessionUser, UserinfoClaims};
