use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use storefront_core::error::CoreError;

use crate::auth::backend::BackendError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce `{ "detail": ... }` JSON bodies,
/// the shape the storefront UI already reads.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `storefront_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The backend answered with a non-success status; relayed as-is.
    #[error("Backend returned {status}: {detail}")]
    Upstream { status: StatusCode, detail: String },

    /// The backend could not be reached or returned an unreadable body.
    #[error("Backend unreachable: {0}")]
    BackendUnreachable(String),

    /// An internal failure, e.g. a panicking handler. Logged, never shown.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// 401 with the generic `Unauthorized` detail used by the gate.
    pub fn unauthorized() -> Self {
        AppError::Core(CoreError::Unauthorized("Unauthorized".into()))
    }

    /// 403 with the generic `Forbidden` detail used by role checks.
    pub fn forbidden() -> Self {
        AppError::Core(CoreError::Forbidden("Forbidden".into()))
    }

    /// Map a failed backend call: transport failures become 502, explicit
    /// rejections keep the backend's status and `detail` (or `fallback`).
    pub fn from_backend(err: BackendError, fallback: &str) -> Self {
        match &err {
            BackendError::Request(e) => AppError::BackendUnreachable(e.to_string()),
            BackendError::Api { status, .. } => AppError::Upstream {
                status: StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                detail: err.detail().unwrap_or_else(|| fallback.to_string()),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            },

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Upstream { status, detail } => (*status, detail.clone()),
            AppError::BackendUnreachable(msg) => {
                tracing::warn!(error = %msg, "Backend unreachable");
                (StatusCode::BAD_GATEWAY, "Backend unreachable".to_string())
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, axum::Json(json!({ "detail": detail }))).into_response()
    }
}
