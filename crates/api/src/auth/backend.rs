//! Client for the backend identity service.
//!
//! [`IdentityBackend`] is the seam the session resolver and auth handlers
//! talk to; [`HttpIdentityBackend`] implements it over the backend REST API
//! using [`reqwest`]:
//!
//! ```text
//! GET  /api/auth/me/               Authorization: Bearer <access>
//! POST /api/auth/refresh/          { "refresh": <token> }
//! POST /api/auth/logout/           { "refresh": <token> }
//! POST /api/auth/login/            { "correo", "password" }
//! POST /api/auth/password-reset/   passthrough
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use storefront_core::user::AuthorizedUser;

use crate::config::BackendConfig;

/// Credentials accepted by the backend login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    pub correo: String,
    pub password: String,
}

/// Status and JSON body of a backend response relayed to the caller
/// regardless of success.
#[derive(Debug, Clone)]
pub struct RelayedResponse {
    pub status: u16,
    /// `None` when the body was empty or not JSON.
    pub body: Option<Value>,
}

/// Errors from the backend REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout) or the
    /// response body could not be decoded.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

impl BackendError {
    /// Whether the failure came from transport or decoding rather than an
    /// explicit rejection by the backend.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, BackendError::Request(_))
    }

    /// The backend's JSON error body, when it sent one.
    pub fn body_json(&self) -> Option<Value> {
        match self {
            BackendError::Api { body, .. } => serde_json::from_str(body).ok(),
            BackendError::Request(_) => None,
        }
    }

    /// The `detail` string of the backend's JSON error body, if any.
    pub fn detail(&self) -> Option<String> {
        self.body_json()
            .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
    }
}

/// Operations the gateway needs from the backend identity service.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Resolve the user behind an access token.
    async fn fetch_user(&self, access_token: &str) -> Result<AuthorizedUser, BackendError>;

    /// Exchange a refresh token. Returns the backend's JSON body, which
    /// carries the new token in `access`.
    async fn refresh(&self, refresh_token: &str) -> Result<Value, BackendError>;

    /// Invalidate a refresh token. `access_token` is sent as a bearer when
    /// known, since the backend logout view requires an authenticated caller.
    async fn logout(
        &self,
        refresh_token: &str,
        access_token: Option<&str>,
    ) -> Result<(), BackendError>;

    /// Authenticate with email and password. Returns the backend's JSON body
    /// (`user`, `access`, `refresh`, optionally `tokens`).
    async fn login(&self, credentials: &LoginCredentials) -> Result<Value, BackendError>;

    /// Forward a password-reset request and relay whatever the backend says.
    async fn password_reset(&self, body: &Value) -> Result<RelayedResponse, BackendError>;
}

/// HTTP client for the backend identity endpoints.
pub struct HttpIdentityBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityBackend {
    /// Create a client with explicit request and connect timeouts so a slow
    /// backend cannot stall every protected request.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, config.base_url.clone()))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`BackendError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(BackendError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl IdentityBackend for HttpIdentityBackend {
    async fn fetch_user(&self, access_token: &str) -> Result<AuthorizedUser, BackendError> {
        let response = self
            .client
            .get(self.url("/api/auth/me/"))
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Value, BackendError> {
        let response = self
            .client
            .post(self.url("/api/auth/refresh/"))
            .json(&serde_json::json!({ "refresh": refresh_token }))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn logout(
        &self,
        refresh_token: &str,
        access_token: Option<&str>,
    ) -> Result<(), BackendError> {
        let mut request = self
            .client
            .post(self.url("/api/auth/logout/"))
            .json(&serde_json::json!({ "refresh": refresh_token }));
        if let Some(access) = access_token {
            request = request.bearer_auth(access);
        }

        Self::ensure_success(request.send().await?).await?;
        Ok(())
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<Value, BackendError> {
        let response = self
            .client
            .post(self.url("/api/auth/login/"))
            .json(credentials)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn password_reset(&self, body: &Value) -> Result<RelayedResponse, BackendError> {
        let response = self
            .client
            .post(self.url("/api/auth/password-reset/"))
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        Ok(RelayedResponse {
            status,
            body: serde_json::from_slice(&bytes).ok(),
        })
    }
}
