//! Session authentication and token-refresh relay.
//!
//! - [`extract`] -- access/refresh token lookup in headers and cookies.
//! - [`backend`] -- client for the backend identity endpoints.
//! - [`session`] -- identity resolution with a single refresh-and-retry.
//! - [`cookies`] -- `Set-Cookie` construction for session cookies.
//! - [`verify`] -- role-gated accessors for API handlers.
//! - [`token_store`] -- request-scoped token storage over cookies.

pub mod backend;
pub mod cookies;
pub mod extract;
pub mod session;
pub mod token_store;
pub mod verify;
