//! Handlers for the `/api/auth` resource (login, logout, refresh, me,
//! password reset).
//!
//! Tokens travel between browser and gateway only as HttpOnly cookies; no
//! response body produced here ever carries a refresh token.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use storefront_core::error::CoreError;
use storefront_core::user::{AuthorizedUser, DisplayUser};

use crate::auth::backend::{BackendError, LoginCredentials};
use crate::auth::token_store::{CookieTokenStore, TokenStore};
use crate::auth::verify::get_user_from_headers;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/auth/login` and `POST /api/admin/login`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub correo: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Successful storefront login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// The backend's user object, untouched.
    pub user: Value,
    pub display: DisplayUser,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// A successful backend login, tokens already split out of the body.
pub(crate) struct BackendLogin {
    pub user: Value,
    pub access: Option<String>,
    pub refresh: Option<String>,
}

impl BackendLogin {
    /// Store the issued tokens as session cookies.
    pub fn into_cookies(self, store: &mut CookieTokenStore) -> Value {
        if let Some(access) = self.access.as_deref() {
            store.set_access_token(access);
        }
        if let Some(refresh) = self.refresh.as_deref() {
            store.set_refresh_token(refresh);
        }
        self.user
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/login
///
/// Authenticate with email + password against the backend and set the
/// session cookies. The body carries the user, never the tokens.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let outcome = backend_login(&state, input).await?;

    let mut store = CookieTokenStore::from_headers(&headers, state.config.cookies.clone());
    let user = outcome.into_cookies(&mut store);
    let display = DisplayUser::from_profile(&user, &state.config.employee_emails);

    let mut response_headers = HeaderMap::new();
    store.apply(&mut response_headers);
    Ok((response_headers, Json(LoginResponse { user, display })))
}

/// POST /api/auth/logout
///
/// Tell the backend to invalidate the refresh token (best effort) and expire
/// every session cookie. Always succeeds.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    end_session(&state, &headers).await
}

/// POST /api/auth/refresh
///
/// Exchange the refresh token (JSON body `refresh`, else cookies) for a new
/// access token, which is set as a cookie.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let mut store = CookieTokenStore::from_headers(&headers, state.config.cookies.clone());

    let refresh_token = refresh_from_body(&body)
        .or_else(|| store.refresh_token().map(str::to_string))
        .ok_or_else(|| AppError::BadRequest("Refresh token missing".into()))?;

    let mut data = match state.backend().refresh(&refresh_token).await {
        Ok(data) => data,
        Err(BackendError::Api { status, body }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            let mut body = serde_json::from_str::<Value>(&body)
                .unwrap_or_else(|_| json!({ "detail": "Refresh failed" }));
            strip_refresh(&mut body);
            tracing::debug!(%status, "Backend rejected refresh");
            return Ok((status, Json(body)).into_response());
        }
        Err(err) => return Err(AppError::from_backend(err, "Refresh failed")),
    };

    if let Some(access) = issued_access_token(&data) {
        store.set_access_token(&access);
    }
    strip_refresh(&mut data);

    let mut response_headers = HeaderMap::new();
    store.apply(&mut response_headers);
    Ok((response_headers, Json(data)).into_response())
}

/// GET /api/auth/me
///
/// The signed-in user as the backend describes them, refreshing the session
/// if the access token expired.
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<(HeaderMap, Json<AuthorizedUser>)> {
    let session = get_user_from_headers(&state.resolver, &headers)
        .await
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Not authenticated".into())))?;

    let headers = session.refreshed_cookie_headers(&state.config.cookies);
    Ok((headers, Json(session.user)))
}

/// POST /api/auth/password-reset
///
/// Relay the request to the backend and mirror its status and body.
pub async fn password_reset(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let relayed = state
        .backend()
        .password_reset(&body)
        .await
        .map_err(|e| AppError::from_backend(e, "Password reset failed"))?;

    let status = StatusCode::from_u16(relayed.status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((status, Json(relayed.body.unwrap_or_else(|| json!({})))))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Validate credentials, call the backend login endpoint and split the
/// tokens out of its response.
pub(crate) async fn backend_login(state: &AppState, input: LoginRequest) -> AppResult<BackendLogin> {
    let (Some(correo), Some(password)) = (
        input.correo.filter(|c| !c.is_empty()),
        input.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(CoreError::Validation("Email and password are required".into()).into());
    };

    let mut data = state
        .backend()
        .login(&LoginCredentials { correo, password })
        .await
        .map_err(|e| AppError::from_backend(e, "Invalid credentials"))?;

    let access = token_field(&data, "access");
    let refresh = token_field(&data, "refresh");
    let user = match data.get_mut("user").map(Value::take) {
        Some(user) if !user.is_null() => user,
        _ => {
            return Err(AppError::Upstream {
                status: StatusCode::BAD_GATEWAY,
                detail: "Invalid response from backend: no user data".into(),
            })
        }
    };

    Ok(BackendLogin {
        user,
        access,
        refresh,
    })
}

/// Best-effort backend logout followed by clearing every session cookie.
pub(crate) async fn end_session(state: &AppState, headers: &HeaderMap) -> (HeaderMap, Json<LogoutResponse>) {
    let mut store = CookieTokenStore::from_headers(headers, state.config.cookies.clone());

    if let Some(refresh) = store.refresh_token() {
        if let Err(e) = state.backend().logout(refresh, store.access_token()).await {
            tracing::warn!(error = %e, "Backend logout failed; clearing cookies anyway");
        }
    }
    store.clear();

    let mut response_headers = HeaderMap::new();
    store.apply(&mut response_headers);
    (response_headers, Json(LogoutResponse { success: true }))
}

/// `name` at the top level of a backend auth body, else under `tokens`.
fn token_field(data: &Value, name: &str) -> Option<String> {
    data.get(name)
        .or_else(|| data.get("tokens").and_then(|t| t.get(name)))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// New access token from a refresh response: `access`, `token` or
/// `tokens.access`.
fn issued_access_token(data: &Value) -> Option<String> {
    token_field(data, "access").or_else(|| {
        data.get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}

fn refresh_from_body(body: &[u8]) -> Option<String> {
    let parsed: Value = serde_json::from_slice(body).ok()?;
    parsed
        .get("refresh")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Remove refresh tokens from a body about to be returned to the browser.
fn strip_refresh(body: &mut Value) {
    if let Some(obj) = body.as_object_mut() {
        obj.remove("refresh");
        if let Some(tokens) = obj.get_mut("tokens").and_then(Value::as_object_mut) {
            tokens.remove("refresh");
        }
    }
}
