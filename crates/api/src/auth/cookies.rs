//! `Set-Cookie` construction for session cookies.
//!
//! Every cookie is `HttpOnly`, `SameSite=Lax`, scoped to `/`, and `Secure`
//! when [`CookieSettings::secure`] is on.

use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use storefront_core::tokens::{ACCESS_COOKIE, LOGOUT_COOKIE_NAMES, REFRESH_COOKIE};

use crate::config::CookieSettings;

const EPOCH_EXPIRES: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Render one session `Set-Cookie` value.
pub fn session_cookie(name: &str, value: &str, max_age_secs: i64, settings: &CookieSettings) -> String {
    let mut cookie = format!(
        "{name}={}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax",
        urlencoding::encode(value)
    );
    if max_age_secs <= 0 {
        cookie.push_str("; Expires=");
        cookie.push_str(EPOCH_EXPIRES);
    }
    if settings.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn append_cookie(headers: &mut HeaderMap, name: &str, cookie: String) {
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(e) => tracing::warn!(cookie = name, error = %e, "Skipping unencodable cookie"),
    }
}

/// Hand a silently refreshed access token back to the browser.
///
/// No-op when `token` is `None`.
pub fn apply_refreshed_access_cookie(
    headers: &mut HeaderMap,
    token: Option<&str>,
    settings: &CookieSettings,
) {
    let Some(token) = token else {
        return;
    };
    let cookie = session_cookie(ACCESS_COOKIE, token, settings.access_max_age_secs, settings);
    append_cookie(headers, ACCESS_COOKIE, cookie);
}

/// Set the access and refresh cookies issued at login.
pub fn append_session_cookies(
    headers: &mut HeaderMap,
    access_token: Option<&str>,
    refresh_token: Option<&str>,
    settings: &CookieSettings,
) {
    apply_refreshed_access_cookie(headers, access_token, settings);
    if let Some(refresh) = refresh_token {
        let cookie = session_cookie(REFRESH_COOKIE, refresh, settings.refresh_max_age_secs, settings);
        append_cookie(headers, REFRESH_COOKIE, cookie);
    }
}

/// Expire every cookie a session may have left behind.
pub fn clear_session_cookies(headers: &mut HeaderMap, settings: &CookieSettings) {
    for name in LOGOUT_COOKIE_NAMES {
        append_cookie(headers, name, session_cookie(name, "", 0, settings));
    }
}
