//! Backend-for-frontend for the training application.
//!
//! Sits between the browser, a Keycloak identity provider, and the
//! downstream API gateway. The browser only ever holds an encrypted
//! session cookie; OAuth2 tokens stay server-side and the gateway sees
//! the caller as an `X-User-ID` header.

pub mod app;
pub mod auth;
pub mod config;
pub mod trainings;
