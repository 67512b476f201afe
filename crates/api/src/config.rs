use storefront_core::tokens::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS};
use storefront_core::user::EmployeeEmailPatterns;

/// Fallback backend base URL for local development.
const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Backend REST API location and client timeout.
    pub backend: BackendConfig,
    /// Cookie attributes for issued session cookies.
    pub cookies: CookieSettings,
    /// Email patterns used for the display-only employee hint.
    pub employee_emails: EmployeeEmailPatterns,
}

/// Where the backend identity service lives.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL without a trailing slash, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Per-call timeout for identity, refresh, login and logout calls.
    pub timeout_secs: u64,
}

/// Attributes applied to every session cookie the gateway writes.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    /// Adds the `Secure` attribute. Enabled when `APP_ENV=production`.
    pub secure: bool,
    pub access_max_age_secs: i64,
    pub refresh_max_age_secs: i64,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: false,
            access_max_age_secs: ACCESS_TOKEN_TTL_SECS,
            refresh_max_age_secs: REFRESH_TOKEN_TTL_SECS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                    |
    /// |-------------------------------|----------------------------|
    /// | `HOST`                        | `0.0.0.0`                  |
    /// | `PORT`                        | `3000`                     |
    /// | `CORS_ORIGINS`                | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`        | `30`                       |
    /// | `BACKEND_URL`                 | `NEXT_PUBLIC_API_URL`, then `http://localhost:8000` |
    /// | `BACKEND_TIMEOUT_SECS`        | `5`                        |
    /// | `APP_ENV`                     | `development`              |
    /// | `ACCESS_COOKIE_MAX_AGE_SECS`  | `900`                      |
    /// | `REFRESH_COOKIE_MAX_AGE_SECS` | `604800`                   |
    /// | `EMPLOYEE_EMAILS`             | empty                      |
    ///
    /// # Panics
    ///
    /// Panics if a numeric variable is set but does not parse.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let backend_url = std::env::var("BACKEND_URL")
            .or_else(|_| std::env::var("NEXT_PUBLIC_API_URL"))
            .unwrap_or_else(|_| DEFAULT_BACKEND_URL.into());

        let backend_timeout_secs: u64 = std::env::var("BACKEND_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("BACKEND_TIMEOUT_SECS must be a valid u64");

        let production = std::env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let access_max_age_secs: i64 = std::env::var("ACCESS_COOKIE_MAX_AGE_SECS")
            .unwrap_or_else(|_| ACCESS_TOKEN_TTL_SECS.to_string())
            .parse()
            .expect("ACCESS_COOKIE_MAX_AGE_SECS must be a valid i64");

        let refresh_max_age_secs: i64 = std::env::var("REFRESH_COOKIE_MAX_AGE_SECS")
            .unwrap_or_else(|_| REFRESH_TOKEN_TTL_SECS.to_string())
            .parse()
            .expect("REFRESH_COOKIE_MAX_AGE_SECS must be a valid i64");

        let employee_emails =
            EmployeeEmailPatterns::parse(&std::env::var("EMPLOYEE_EMAILS").unwrap_or_default());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            backend: BackendConfig::new(&backend_url, backend_timeout_secs),
            cookies: CookieSettings {
                secure: production,
                access_max_age_secs,
                refresh_max_age_secs,
            },
            employee_emails,
        }
    }
}

impl BackendConfig {
    /// Normalizes `base_url` by stripping one trailing slash.
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.strip_suffix('/').unwrap_or(base_url).to_string(),
            timeout_secs,
        }
    }
}
