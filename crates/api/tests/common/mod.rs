#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get as get_route, post as post_route};
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use storefront_api::auth::backend::HttpIdentityBackend;
use storefront_api::config::{BackendConfig, CookieSettings, ServerConfig};
use storefront_api::middleware::gate::{USER_ID_HEADER, USER_STAFF_HEADER, USER_SUPER_HEADER};
use storefront_api::middleware::rbac::{RequireSuperuser, RequireUser};
use storefront_api::router::build_app_router_with;
use storefront_api::state::AppState;
use storefront_core::user::EmployeeEmailPatterns;

// ---------------------------------------------------------------------------
// Stub backend
// ---------------------------------------------------------------------------

/// Access token of a staff member (id 1).
pub const STAFF_ACCESS: &str = "staff-access";
/// Access token of a plain customer (id 2).
pub const USER_ACCESS: &str = "user-access";
/// Access token of a superuser (id 3).
pub const SUPER_ACCESS: &str = "super-access";
/// Refresh token the backend accepts; it mints [`FRESH_ACCESS`].
pub const GOOD_REFRESH: &str = "good-refresh";
/// Access token minted by refreshing [`GOOD_REFRESH`] (staff, id 4).
pub const FRESH_ACCESS: &str = "fresh-access";

/// Calls received by the stub backend, per endpoint.
#[derive(Debug, Default)]
pub struct BackendCalls {
    pub me: AtomicUsize,
    pub refresh: AtomicUsize,
    pub logout: AtomicUsize,
    pub login: AtomicUsize,
}

impl BackendCalls {
    pub fn me(&self) -> usize {
        self.me.load(Ordering::SeqCst)
    }

    pub fn refresh(&self) -> usize {
        self.refresh.load(Ordering::SeqCst)
    }

    pub fn logout(&self) -> usize {
        self.logout.load(Ordering::SeqCst)
    }

    pub fn login(&self) -> usize {
        self.login.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.me() + self.refresh() + self.logout() + self.login()
    }
}

fn rejected() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" })),
    )
        .into_response()
}

fn user_for(token: &str) -> Option<Value> {
    let (id, correo, is_staff, is_superuser) = match token {
        STAFF_ACCESS => (1, "staff@tienda.cl", true, false),
        USER_ACCESS => (2, "cliente@gmail.com", false, false),
        SUPER_ACCESS => (3, "root@tienda.cl", false, true),
        FRESH_ACCESS => (4, "refreshed@tienda.cl", true, false),
        _ => return None,
    };
    Some(json!({
        "id_cuenta": id,
        "correo": correo,
        "nombre": "Test",
        "is_staff": is_staff,
        "is_superuser": is_superuser,
    }))
}

async fn stub_me(State(calls): State<Arc<BackendCalls>>, headers: HeaderMap) -> Response {
    calls.me.fetch_add(1, Ordering::SeqCst);
    let user = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(user_for);
    match user {
        Some(user) => Json(user).into_response(),
        None => rejected(),
    }
}

async fn stub_refresh(State(calls): State<Arc<BackendCalls>>, Json(body): Json<Value>) -> Response {
    calls.refresh.fetch_add(1, Ordering::SeqCst);
    if body["refresh"] == GOOD_REFRESH {
        Json(json!({ "access": FRESH_ACCESS, "refresh": "rotated-refresh" })).into_response()
    } else {
        rejected()
    }
}

async fn stub_logout(State(calls): State<Arc<BackendCalls>>, Json(body): Json<Value>) -> Response {
    calls.logout.fetch_add(1, Ordering::SeqCst);
    if body["refresh"] == GOOD_REFRESH {
        StatusCode::RESET_CONTENT.into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Token is blacklisted" })),
        )
            .into_response()
    }
}

async fn stub_login(State(calls): State<Arc<BackendCalls>>, Json(body): Json<Value>) -> Response {
    calls.login.fetch_add(1, Ordering::SeqCst);
    if body["password"] != "secret" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Credenciales inválidas" })),
        )
            .into_response();
    }
    match body["correo"].as_str() {
        Some("staff@tienda.cl") => Json(json!({
            "user": user_for(STAFF_ACCESS),
            "tokens": { "access": STAFF_ACCESS, "refresh": GOOD_REFRESH },
        }))
        .into_response(),
        Some("cliente@gmail.com") => Json(json!({
            "user": user_for(USER_ACCESS),
            "access": USER_ACCESS,
            "refresh": "customer-refresh",
        }))
        .into_response(),
        Some("broken@tienda.cl") => Json(json!({ "access": "a" })).into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Credenciales inválidas" })),
        )
            .into_response(),
    }
}

async fn stub_password_reset(Json(body): Json<Value>) -> Response {
    if body.get("correo").is_some() {
        Json(json!({ "detail": "Correo enviado" })).into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "correo": ["Este campo es requerido."] })),
        )
            .into_response()
    }
}

/// Serve the stub backend on an ephemeral local port. Returns its base URL
/// and the shared call counters.
pub async fn spawn_backend() -> (String, Arc<BackendCalls>) {
    let calls = Arc::new(BackendCalls::default());
    let app = Router::new()
        .route("/api/auth/me/", get_route(stub_me))
        .route("/api/auth/refresh/", post_route(stub_refresh))
        .route("/api/auth/logout/", post_route(stub_logout))
        .route("/api/auth/login/", post_route(stub_login))
        .route("/api/auth/password-reset/", post_route(stub_password_reset))
        .with_state(Arc::clone(&calls));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub backend");
    let addr = listener.local_addr().expect("stub backend address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub backend");
    });

    (format!("http://{addr}"), calls)
}

/// Serve a backend whose identity endpoint answers only after `delay`.
pub async fn spawn_slow_backend(delay: Duration) -> String {
    let app = Router::new().route(
        "/api/auth/me/",
        get_route(move || async move {
            tokio::time::sleep(delay).await;
            Json(json!({ "id": 1, "is_staff": true, "is_superuser": false }))
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind slow backend");
    let addr = listener.local_addr().expect("slow backend address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("slow backend");
    });

    format!("http://{addr}")
}

// ---------------------------------------------------------------------------
// Gated downstream routes
// ---------------------------------------------------------------------------

/// Echo what the gate forwarded to a downstream admin API handler.
async fn echo_admin_users(headers: HeaderMap) -> Json<Value> {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(json!({
        "authorization": read(AUTHORIZATION.as_str()),
        "user_id": read(USER_ID_HEADER),
        "staff": read(USER_STAFF_HEADER),
        "super": read(USER_SUPER_HEADER),
    }))
}

async fn orders_page(headers: HeaderMap) -> Json<Value> {
    Json(json!({
        "page": "orders",
        "staff_header": headers.get(USER_STAFF_HEADER).and_then(|v| v.to_str().ok()),
    }))
}

async fn superuser_only(RequireSuperuser(session): RequireSuperuser) -> Json<Value> {
    Json(json!({ "id": session.user.id() }))
}

async fn profile(
    State(state): State<AppState>,
    RequireUser(session): RequireUser,
) -> (HeaderMap, Json<Value>) {
    (
        session.refreshed_cookie_headers(&state.config.cookies),
        Json(json!({
            "id": session.user.id(),
            "refreshed": session.refreshed_access_token.is_some(),
        })),
    )
}

async fn panicking_page() -> &'static str {
    panic!("template missing")
}

fn downstream_routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get_route(echo_admin_users))
        .route("/api/admin/settings", get_route(superuser_only))
        .route("/admin/orders", get_route(orders_page))
        .route("/admin/login", get_route(|| async { "login page" }))
        .route("/api/profile", get_route(profile))
        .route("/catalog", get_route(|| async { "catalog" }))
        .route("/catalog/broken", get_route(panicking_page))
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults pointed at `backend_url`.
pub fn test_config(backend_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        backend: BackendConfig::new(backend_url, 5),
        cookies: CookieSettings::default(),
        employee_emails: EmployeeEmailPatterns::parse("@tienda.cl"),
    }
}

/// The full application router plus the stub backend's call counters.
pub struct TestApp {
    pub router: Router,
    pub calls: Arc<BackendCalls>,
}

/// Build the full application router, with all middleware layers, in front
/// of a fresh stub backend.
pub async fn build_test_app() -> TestApp {
    let (backend_url, calls) = spawn_backend().await;
    TestApp {
        router: build_test_app_for(&backend_url),
        calls,
    }
}

/// Build the full application router against an arbitrary backend URL.
pub fn build_test_app_for(backend_url: &str) -> Router {
    build_test_app_with(test_config(backend_url))
}

/// Build the full application router from an explicit config.
pub fn build_test_app_with(config: ServerConfig) -> Router {
    let backend = HttpIdentityBackend::new(&config.backend).expect("backend client");
    let state = AppState::new(config.clone(), Arc::new(backend));
    build_app_router_with(state, &config, downstream_routes())
}

/// A backend URL nothing listens on.
pub async fn unreachable_backend_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind free port");
    let addr = listener.local_addr().expect("free port address");
    drop(listener);
    format!("http://{addr}")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("infallible router")
}

pub async fn get(app: Router, uri: &str) -> Response {
    get_with(app, uri, &[]).await
}

/// GET with extra headers, e.g. `&[("cookie", "access_token=x")]`.
pub async fn get_with(app: Router, uri: &str, headers: &[(&str, &str)]) -> Response {
    let mut builder = Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn get_with_cookie(app: Router, uri: &str, cookie: &str) -> Response {
    get_with(app, uri, &[(COOKIE.as_str(), cookie)]).await
}

pub async fn get_with_bearer(app: Router, uri: &str, token: &str) -> Response {
    let value = format!("Bearer {token}");
    get_with(app, uri, &[(AUTHORIZATION.as_str(), value.as_str())]).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    post_json_with(app, uri, body, &[]).await
}

pub async fn post_json_with(
    app: Router,
    uri: &str,
    body: Value,
    headers: &[(&str, &str)],
) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

/// POST with no body at all.
pub async fn post_empty(app: Router, uri: &str, headers: &[(&str, &str)]) -> Response {
    let mut builder = Request::builder().method("POST").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Every `Set-Cookie` header on a response.
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// The `Set-Cookie` header for `name`, if any.
pub fn set_cookie_for(response: &Response, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    set_cookies(response)
        .into_iter()
        .find(|c| c.starts_with(&prefix))
}
