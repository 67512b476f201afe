//! Route gate: authentication in front of admin pages and the admin API.
//!
//! Per request the gate moves through these states:
//!
//! ```text
//! Unprotected                      allow-listed or unprotected path, forward untouched
//! NeedsAuthNoToken  -> Denied      protected, no access token and no refresh cookie
//! NeedsAuthChecking -> Authorized  resolver found a user
//! NeedsAuthChecking -> Denied      resolver found nobody
//! ```
//!
//! `Denied` is a 401 JSON body on API paths and a redirect to the login page
//! (with `next=<path>`) on page paths. `Authorized` forwards the request with
//! `Authorization: Bearer <access>` and, on API paths, the identity headers
//! below; a refreshed access token is set as a cookie on the response.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Serialize;
use storefront_core::types::UserId;
use storefront_core::user::AuthorizedUser;

use crate::auth::cookies::apply_refreshed_access_cookie;
use crate::auth::extract::{extract_access_token, extract_refresh_token, RequestCookies, TokenSource};
use crate::auth::session::AuthFailure;
use crate::auth::verify::SessionUser;
use crate::error::AppError;
use crate::state::AppState;

/// Resolved user id, forwarded on authorized API requests.
pub const USER_ID_HEADER: &str = "x-user-id";
/// `"true"` / `"false"`: the user's `is_staff` flag.
pub const USER_STAFF_HEADER: &str = "x-user-staff";
/// `"true"` / `"false"`: the user's `is_superuser` flag.
pub const USER_SUPER_HEADER: &str = "x-user-super";

const IDENTITY_HEADERS: [&str; 3] = [USER_ID_HEADER, USER_STAFF_HEADER, USER_SUPER_HEADER];

/// Gate states, logged as each request is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Unprotected,
    NeedsAuthNoToken,
    NeedsAuthChecking,
    Authorized,
    Denied,
}

/// How a path is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    Unprotected,
    /// Admin UI page; denial redirects to the login page.
    Page,
    /// Admin API; denial is a 401 JSON body.
    Api,
}

/// Which paths the gate protects.
///
/// Prefixes match on segment boundaries: `/admin` covers `/admin` and
/// `/admin/orders` but not `/administrator`.
#[derive(Debug, Clone)]
pub struct GatePolicy {
    /// Login page; it and everything under it is always open.
    pub login_page: String,
    /// Prefix of protected UI pages.
    pub page_prefix: String,
    /// Prefixes of protected API routes.
    pub api_prefixes: Vec<String>,
    /// Exact paths that stay open inside protected prefixes.
    pub open_paths: Vec<String>,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            login_page: "/admin/login".into(),
            page_prefix: "/admin".into(),
            api_prefixes: vec!["/api/admin".into()],
            open_paths: vec!["/api/admin/login".into(), "/api/admin/logout".into()],
        }
    }
}

impl GatePolicy {
    pub fn classify(&self, path: &str) -> PathClass {
        if is_under(path, &self.login_page) || self.open_paths.iter().any(|p| p == path) {
            return PathClass::Unprotected;
        }
        if self.api_prefixes.iter().any(|p| is_under(path, p)) {
            PathClass::Api
        } else if is_under(path, &self.page_prefix) {
            PathClass::Page
        } else {
            PathClass::Unprotected
        }
    }

    /// Login page URL that returns to `path` after signing in.
    pub fn login_redirect(&self, path: &str) -> String {
        format!("{}?next={}", self.login_page, urlencoding::encode(path))
    }
}

fn is_under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Identity the gate writes as `x-user-*` headers on authorized API
/// requests. Downstream handlers may trust those headers: the gate strips
/// client-supplied copies on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForwardedIdentity {
    pub user_id: UserId,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl ForwardedIdentity {
    pub fn write(&self, headers: &mut HeaderMap) {
        headers.insert(USER_ID_HEADER, HeaderValue::from(self.user_id));
        headers.insert(USER_STAFF_HEADER, bool_header(self.is_staff));
        headers.insert(USER_SUPER_HEADER, bool_header(self.is_superuser));
    }
}

impl From<&AuthorizedUser> for ForwardedIdentity {
    fn from(user: &AuthorizedUser) -> Self {
        Self {
            user_id: user.id(),
            is_staff: user.is_staff(),
            is_superuser: user.is_superuser(),
        }
    }
}

fn bool_header(flag: bool) -> HeaderValue {
    HeaderValue::from_static(if flag { "true" } else { "false" })
}

/// Axum middleware enforcing [`GatePolicy`]. Install with
/// `axum::middleware::from_fn_with_state`.
pub async fn route_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    for name in IDENTITY_HEADERS {
        request.headers_mut().remove(name);
    }

    let path = request.uri().path().to_string();
    let class = state.gate.classify(&path);
    if class == PathClass::Unprotected {
        tracing::trace!(%path, state = ?GateState::Unprotected, "Gate");
        return next.run(request).await;
    }

    let resolution = {
        let headers = request.headers();
        let cookies = RequestCookies::from_headers(headers);
        let source = TokenSource::with_cookies(headers, &cookies);

        if extract_access_token(&source).is_none() && extract_refresh_token(&source).is_none() {
            tracing::debug!(%path, state = ?GateState::NeedsAuthNoToken, "Gate");
            return deny(&state, class, &path, AuthFailure::NoCredentials);
        }

        tracing::debug!(%path, state = ?GateState::NeedsAuthChecking, "Gate");
        state.resolver.resolve_user(&source).await
    };

    let refreshed = resolution.refreshed_access_token.clone();
    let Some(mut session) = SessionUser::from_resolution(resolution.clone()) else {
        let reason = resolution
            .failure
            .unwrap_or(AuthFailure::InvalidOrExpiredAccess);
        return deny(&state, class, &path, reason);
    };
    // The gate owns cookie propagation for this request.
    session.refreshed_access_token = None;

    let headers = request.headers_mut();
    if let Some(access) = session.access_token.as_deref() {
        match HeaderValue::from_str(&format!("Bearer {access}")) {
            Ok(value) => {
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!("Resolved access token is not a valid header value"),
        }
    }
    if class == PathClass::Api {
        ForwardedIdentity::from(&session.user).write(headers);
    }

    tracing::debug!(
        %path,
        state = ?GateState::Authorized,
        user_id = session.user.id(),
        refreshed = refreshed.is_some(),
        "Gate"
    );
    request.extensions_mut().insert(session);

    let mut response = next.run(request).await;
    apply_refreshed_access_cookie(
        response.headers_mut(),
        refreshed.as_deref(),
        &state.config.cookies,
    );
    response
}

fn deny(state: &AppState, class: PathClass, path: &str, reason: AuthFailure) -> Response {
    tracing::debug!(%path, state = ?GateState::Denied, %reason, "Gate");
    match class {
        PathClass::Api => AppError::unauthorized().into_response(),
        _ => Redirect::temporary(&state.gate.login_redirect(path)).into_response(),
    }
}
