//! Role-gated accessors for API handlers that need the caller's identity
//! without the gate's redirect semantics.
//!
//! Each returns a [`SessionUser`] on success and `None` otherwise; the
//! handler decides between 401 and 403.

use std::fmt;

use axum::http::HeaderMap;
use storefront_core::roles::RoleRequirement;
use storefront_core::user::AuthorizedUser;

use crate::config::CookieSettings;

use super::cookies::apply_refreshed_access_cookie;
use super::extract::TokenSource;
use super::session::{AuthResolution, SessionResolver};

/// A resolved caller plus the tokens a handler needs to call the backend on
/// its behalf and to propagate a refreshed cookie.
#[derive(Clone)]
pub struct SessionUser {
    pub user: AuthorizedUser,
    /// Token to forward to the backend as `Authorization: Bearer`.
    pub access_token: Option<String>,
    /// Set when resolution refreshed the session; pass to
    /// [`apply_refreshed_access_cookie`](super::cookies::apply_refreshed_access_cookie).
    pub refreshed_access_token: Option<String>,
}

impl SessionUser {
    pub fn from_resolution(resolution: AuthResolution) -> Option<Self> {
        let user = resolution.user?;
        Some(Self {
            user,
            access_token: resolution.access_token,
            refreshed_access_token: resolution.refreshed_access_token,
        })
    }

    /// Response headers handing a silently refreshed access token back to
    /// the browser. Empty when the session was not refreshed.
    pub fn refreshed_cookie_headers(&self, settings: &CookieSettings) -> HeaderMap {
        let mut headers = HeaderMap::new();
        apply_refreshed_access_cookie(&mut headers, self.refreshed_access_token.as_deref(), settings);
        headers
    }
}

impl fmt::Debug for SessionUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionUser")
            .field("user_id", &self.user.id())
            .field("is_staff", &self.user.is_staff())
            .field("is_superuser", &self.user.is_superuser())
            .field("refreshed", &self.refreshed_access_token.is_some())
            .finish()
    }
}

async fn resolve_with_role(
    resolver: &SessionResolver,
    headers: &HeaderMap,
    role: RoleRequirement,
) -> Option<SessionUser> {
    resolver
        .require_user(&TokenSource::headers(headers), role)
        .await
        .and_then(SessionUser::from_resolution)
}

/// Any authenticated caller.
pub async fn get_user_from_headers(
    resolver: &SessionResolver,
    headers: &HeaderMap,
) -> Option<SessionUser> {
    resolve_with_role(resolver, headers, RoleRequirement::Any).await
}

/// Staff or superuser callers.
pub async fn require_staff(resolver: &SessionResolver, headers: &HeaderMap) -> Option<SessionUser> {
    resolve_with_role(resolver, headers, RoleRequirement::Staff).await
}

/// Superuser callers only.
pub async fn require_superuser(
    resolver: &SessionResolver,
    headers: &HeaderMap,
) -> Option<SessionUser> {
    resolve_with_role(resolver, headers, RoleRequirement::Superuser).await
}
