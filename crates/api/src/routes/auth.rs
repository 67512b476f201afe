//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/api/auth`.
///
/// ```text
/// POST /login           -> login
/// POST /logout          -> logout
/// POST /refresh         -> refresh
/// GET  /me              -> me
/// POST /password-reset  -> password_reset
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/refresh", post(auth::refresh))
        .route("/me", get(auth::me))
        .route("/password-reset", post(auth::password_reset))
}
