pub mod admin;
pub mod auth;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                  login (public)
/// /auth/logout                 logout (public)
/// /auth/refresh                refresh (public)
/// /auth/me                     current user
/// /auth/password-reset         password reset relay (public)
///
/// /admin/login                 staff login (allow-listed by the gate)
/// /admin/logout                logout (allow-listed by the gate)
/// /admin/session               staff identity (gated)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/admin", admin::router())
}
