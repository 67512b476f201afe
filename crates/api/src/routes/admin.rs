//! Route definitions for the `/admin` session endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/api/admin`.
///
/// ```text
/// POST /login    -> login (public)
/// POST /logout   -> logout (public)
/// GET  /session  -> session (staff; behind the route gate)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(admin::login))
        .route("/logout", post(admin::logout))
        .route("/session", get(admin::session))
}
