//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`SessionUser`] and rejects requests whose flags do
//! not meet the requirement. Use these in route handlers to enforce
//! authorization at the type level.
//!
//! Handlers mounted outside the route gate must return
//! [`SessionUser::refreshed_cookie_headers`] with their response, or a
//! silently refreshed access token never reaches the browser.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use storefront_core::roles::RoleRequirement;

use crate::auth::verify::SessionUser;
use crate::error::AppError;
use crate::state::AppState;

async fn session_with_role(
    parts: &mut Parts,
    state: &AppState,
    role: RoleRequirement,
) -> Result<SessionUser, AppError> {
    let session = SessionUser::from_request_parts(parts, state).await?;
    if !role.is_satisfied_by(&session.user) {
        tracing::debug!(user_id = session.user.id(), %role, "Role requirement not met");
        return Err(AppError::forbidden());
    }
    Ok(session)
}

/// Requires staff or superuser. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn staff_only(RequireStaff(session): RequireStaff) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireStaff(pub SessionUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        session_with_role(parts, state, RoleRequirement::Staff)
            .await
            .map(RequireStaff)
    }
}

/// Requires superuser. Rejects with 403 Forbidden otherwise.
pub struct RequireSuperuser(pub SessionUser);

impl FromRequestParts<AppState> for RequireSuperuser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        session_with_role(parts, state, RoleRequirement::Superuser)
            .await
            .map(RequireSuperuser)
    }
}

/// Requires any authenticated user.
///
/// Functionally equivalent to [`SessionUser`] but named explicitly for
/// route definitions where "this route requires authentication" should be
/// self-documenting.
pub struct RequireUser(pub SessionUser);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        session_with_role(parts, state, RoleRequirement::Any)
            .await
            .map(RequireUser)
    }
}
