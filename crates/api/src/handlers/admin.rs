//! Handlers for the `/api/admin` session endpoints.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use storefront_core::error::CoreError;
use storefront_core::roles::RoleRequirement;
use storefront_core::user::AuthorizedUser;

use super::auth::{backend_login, end_session, LoginRequest};
use crate::auth::token_store::CookieTokenStore;
use crate::error::{AppError, AppResult};
use crate::middleware::gate::ForwardedIdentity;
use crate::middleware::rbac::RequireStaff;
use crate::state::AppState;

/// Successful admin login.
#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub user: Value,
    pub allowed: bool,
}

/// POST /api/admin/login
///
/// Like the storefront login, but only staff and superusers get a session.
/// Nobody else has cookies set.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = backend_login(&state, input).await?;

    let user: AuthorizedUser = serde_json::from_value(outcome.user.clone()).map_err(|e| {
        AppError::Upstream {
            status: StatusCode::BAD_GATEWAY,
            detail: format!("Invalid response from backend: {e}"),
        }
    })?;
    if !RoleRequirement::Staff.is_satisfied_by(&user) {
        tracing::info!(user_id = user.id(), "Admin login refused: not staff");
        return Err(AppError::Core(CoreError::Forbidden(
            "Admin permissions required".into(),
        )));
    }

    let mut store = CookieTokenStore::from_headers(&headers, state.config.cookies.clone());
    let user = outcome.into_cookies(&mut store);

    let mut response_headers = HeaderMap::new();
    store.apply(&mut response_headers);
    Ok((
        response_headers,
        Json(AdminLoginResponse {
            user,
            allowed: true,
        }),
    ))
}

/// POST /api/admin/logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    end_session(&state, &headers).await
}

/// GET /api/admin/session
///
/// Identity and role flags of the signed-in staff member, for the admin UI.
pub async fn session(
    State(state): State<AppState>,
    RequireStaff(session): RequireStaff,
) -> (HeaderMap, Json<ForwardedIdentity>) {
    (
        session.refreshed_cookie_headers(&state.config.cookies),
        Json(ForwardedIdentity::from(&session.user)),
    )
}
