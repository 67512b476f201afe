//! Session token cookie names and lifetimes.
//!
//! The first name in each list is the canonical cookie written by the
//! gateway; the rest are legacy names still accepted on read.

/// Canonical access-token cookie.
pub const ACCESS_COOKIE: &str = "access_token";

/// Canonical refresh-token cookie.
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Access-token cookie names, in lookup priority order.
pub const ACCESS_COOKIE_NAMES: [&str; 3] = [ACCESS_COOKIE, "access", "token"];

/// Refresh-token cookie names, in lookup priority order.
pub const REFRESH_COOKIE_NAMES: [&str; 2] = [REFRESH_COOKIE, "refresh"];

/// Cookies expired on logout.
pub const LOGOUT_COOKIE_NAMES: [&str; 4] = [ACCESS_COOKIE, REFRESH_COOKIE, "access", "token"];

/// Access-token cookie lifetime in seconds (15 minutes).
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Refresh-token cookie lifetime in seconds (7 days).
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Prefix of a bearer `Authorization` header value. Matched case-sensitively.
pub const BEARER_PREFIX: &str = "Bearer ";
