//! Tests for `AppError` → HTTP response mapping.
//!
//! Most tests call `IntoResponse` directly on `AppError` values; the panic
//! test goes through the full middleware stack.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use storefront_api::auth::backend::BackendError;
use storefront_api::error::AppError;
use storefront_core::error::CoreError;

use common::{body_json, build_test_app, get};

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Core errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unauthorized_returns_401_with_generic_detail() {
    let (status, json) = error_to_response(AppError::unauthorized()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json, serde_json::json!({ "detail": "Unauthorized" }));
}

#[tokio::test]
async fn forbidden_returns_403() {
    let (status, json) = error_to_response(AppError::forbidden()).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["detail"], "Forbidden");
}

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::Validation("Unknown role requirement".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "Unknown role requirement");
}

// ---------------------------------------------------------------------------
// HTTP-specific errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bad_request_returns_400() {
    let (status, json) = error_to_response(AppError::BadRequest("Refresh token missing".into())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "Refresh token missing");
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("backend credentials leaked".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["detail"], "An internal error occurred");
}

#[tokio::test]
async fn backend_unreachable_returns_502() {
    let err = AppError::BackendUnreachable("connection refused".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["detail"], "Backend unreachable");
}

// ---------------------------------------------------------------------------
// Backend error mapping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn backend_rejection_keeps_status_and_detail() {
    let err = BackendError::Api {
        status: 401,
        body: r#"{"detail":"Credenciales inválidas"}"#.into(),
    };

    let mapped = AppError::from_backend(err, "Invalid credentials");
    assert_matches!(mapped, AppError::Upstream { status, .. } if status == StatusCode::UNAUTHORIZED);

    let (status, json) = error_to_response(mapped).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["detail"], "Credenciales inválidas");
}

#[tokio::test]
async fn backend_rejection_without_detail_uses_fallback() {
    let err = BackendError::Api {
        status: 400,
        body: "<html>Bad Request</html>".into(),
    };

    let (status, json) = error_to_response(AppError::from_backend(err, "Invalid credentials")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["detail"], "Invalid credentials");
}

#[tokio::test]
async fn backend_transport_failure_maps_to_unreachable() {
    let err = reqwest::Client::new()
        .get("not a url")
        .build()
        .expect_err("invalid url must fail to build");

    let mapped = AppError::from_backend(BackendError::Request(err), "Refresh failed");

    assert_matches!(mapped, AppError::BackendUnreachable(_));
}

// ---------------------------------------------------------------------------
// Panic recovery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn panicking_handler_returns_sanitized_500() {
    let app = build_test_app().await;

    let response = get(app.router.clone(), "/catalog/broken").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json, serde_json::json!({ "detail": "An internal error occurred" }));
}
