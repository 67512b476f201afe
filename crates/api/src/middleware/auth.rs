//! Session extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::extract::{RequestCookies, TokenSource};
use crate::auth::verify::SessionUser;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated caller resolved from the bearer header or session cookies.
///
/// Reuses the identity the route gate already resolved for this request;
/// otherwise resolves it against the backend (refreshing at most once).
/// Rejects with 401 when nobody is signed in.
///
/// ```ignore
/// async fn my_handler(session: SessionUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = session.user.id(), "handling request");
///     Ok(Json(()))
/// }
/// ```
///
/// Outside the gate nothing else sets the refreshed access cookie: return
/// [`SessionUser::refreshed_cookie_headers`] with the response.
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<SessionUser>() {
            return Ok(session.clone());
        }

        let cookies = RequestCookies::from_headers(&parts.headers);
        let source = TokenSource::with_cookies(&parts.headers, &cookies);
        let resolution = state.resolver.resolve_user(&source).await;

        SessionUser::from_resolution(resolution).ok_or_else(AppError::unauthorized)
    }
}
