//! Storefront session gateway library.
//!
//! Exposes the building blocks (config, state, error handling, the auth
//! pipeline, routes) so integration tests and the binary entrypoint can both
//! access them.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
