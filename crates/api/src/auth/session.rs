//! Session resolution: raw tokens in, validated identity out.
//!
//! [`SessionResolver::resolve_user`] asks the backend who the access token
//! belongs to and, if that fails and a refresh token is present, performs
//! exactly one refresh followed by one more identity call. Backend failures
//! of any kind degrade to "no user"; nothing here returns an error.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use storefront_core::roles::RoleRequirement;
use storefront_core::user::AuthorizedUser;

use super::backend::{BackendError, IdentityBackend};
use super::extract::{extract_access_token, extract_refresh_token, TokenSource};

/// Why a resolution produced no (sufficiently privileged) user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// No access token and no refresh token were presented.
    NoCredentials,
    /// The backend rejected the access token and no refresh could replace it.
    InvalidOrExpiredAccess,
    /// The backend rejected the refresh token.
    InvalidOrExpiredRefresh,
    /// A backend call failed in transport or returned an unreadable body.
    BackendUnreachable,
    /// A user was resolved but lacks the required role.
    InsufficientRole,
}

impl AuthFailure {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthFailure::NoCredentials => "no_credentials",
            AuthFailure::InvalidOrExpiredAccess => "invalid_or_expired_access",
            AuthFailure::InvalidOrExpiredRefresh => "invalid_or_expired_refresh",
            AuthFailure::BackendUnreachable => "backend_unreachable",
            AuthFailure::InsufficientRole => "insufficient_role",
        }
    }
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one resolution. Lives for a single request.
#[derive(Clone, Default)]
pub struct AuthResolution {
    pub user: Option<AuthorizedUser>,
    /// The token the user was resolved with: the refreshed one if a refresh
    /// happened, otherwise the presented one.
    pub access_token: Option<String>,
    /// The presented refresh token, unchanged.
    pub refresh_token: Option<String>,
    /// Newly minted access token, if a refresh happened.
    pub refreshed_access_token: Option<String>,
    /// Set whenever `user` is `None`.
    pub failure: Option<AuthFailure>,
}

// Tokens are redacted so a resolution can be logged with `?`.
impl fmt::Debug for AuthResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResolution")
            .field("user_id", &self.user.as_ref().map(AuthorizedUser::id))
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("refreshed", &self.refreshed_access_token.is_some())
            .field("failure", &self.failure)
            .finish()
    }
}

/// Validates tokens against the backend identity service.
///
/// Cheaply cloneable; holds no per-request state.
#[derive(Clone)]
pub struct SessionResolver {
    backend: Arc<dyn IdentityBackend>,
}

impl SessionResolver {
    pub fn new(backend: Arc<dyn IdentityBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn IdentityBackend> {
        &self.backend
    }

    /// Resolve the caller behind `source`.
    ///
    /// Makes at most three backend calls, in this order: identity with the
    /// presented access token, one refresh, identity with the refreshed
    /// token.
    pub async fn resolve_user(&self, source: &TokenSource<'_>) -> AuthResolution {
        let mut access_token = extract_access_token(source);
        let refresh_token = extract_refresh_token(source);

        if access_token.is_none() && refresh_token.is_none() {
            return AuthResolution {
                failure: Some(AuthFailure::NoCredentials),
                ..AuthResolution::default()
            };
        }

        let mut user = None;
        let mut failure = None;
        let mut refreshed_access_token = None;

        if let Some(token) = access_token.as_deref() {
            match self.backend.fetch_user(token).await {
                Ok(found) => user = Some(found),
                Err(e) => failure = Some(classify(&e, AuthFailure::InvalidOrExpiredAccess)),
            }
        }

        if user.is_none() {
            if let Some(refresh) = refresh_token.as_deref() {
                match self.refresh_access(refresh).await {
                    Ok(new_access) => {
                        tracing::debug!("Access token refreshed");
                        match self.backend.fetch_user(&new_access).await {
                            Ok(found) => user = Some(found),
                            Err(e) => {
                                failure = Some(classify(&e, AuthFailure::InvalidOrExpiredAccess))
                            }
                        }
                        access_token = Some(new_access.clone());
                        refreshed_access_token = Some(new_access);
                    }
                    Err(f) => failure = Some(f),
                }
            }
        }

        if user.is_some() {
            failure = None;
        } else {
            tracing::debug!(failure = ?failure, "Session resolution yielded no user");
        }

        AuthResolution {
            user,
            access_token,
            refresh_token,
            refreshed_access_token,
            failure,
        }
    }

    /// Resolve and check `role`, reporting why access is refused.
    pub async fn authorize(
        &self,
        source: &TokenSource<'_>,
        role: RoleRequirement,
    ) -> Result<AuthResolution, AuthFailure> {
        let resolution = self.resolve_user(source).await;
        check_role(resolution, role)
    }

    /// Resolve and check `role`; `None` if unauthenticated or the role is
    /// insufficient.
    pub async fn require_user(
        &self,
        source: &TokenSource<'_>,
        role: RoleRequirement,
    ) -> Option<AuthResolution> {
        self.authorize(source, role).await.ok()
    }

    /// One refresh call. Yields the new access token or the failure kind.
    async fn refresh_access(&self, refresh_token: &str) -> Result<String, AuthFailure> {
        let body = self
            .backend
            .refresh(refresh_token)
            .await
            .map_err(|e| classify(&e, AuthFailure::InvalidOrExpiredRefresh))?;

        body.get("access")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .ok_or(AuthFailure::InvalidOrExpiredRefresh)
    }
}

/// Apply a role requirement to a finished resolution.
pub fn check_role(
    resolution: AuthResolution,
    role: RoleRequirement,
) -> Result<AuthResolution, AuthFailure> {
    match &resolution.user {
        None => Err(resolution
            .failure
            .unwrap_or(AuthFailure::InvalidOrExpiredAccess)),
        Some(user) if !role.is_satisfied_by(user) => {
            tracing::debug!(user_id = user.id(), %role, "Role requirement not met");
            Err(AuthFailure::InsufficientRole)
        }
        Some(_) => Ok(resolution),
    }
}

fn classify(err: &BackendError, rejection: AuthFailure) -> AuthFailure {
    if err.is_unreachable() {
        tracing::warn!(error = %err, "Identity backend call failed");
        AuthFailure::BackendUnreachable
    } else {
        rejection
    }
}
