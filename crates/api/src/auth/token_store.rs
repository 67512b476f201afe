//! Request-scoped token storage backed by cookies.
//!
//! Handlers read and mutate session tokens through [`TokenStore`] instead of
//! touching cookie headers directly; the pending `Set-Cookie` headers are
//! written to the response with [`CookieTokenStore::apply`].

use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;

use super::cookies::{append_session_cookies, apply_refreshed_access_cookie, clear_session_cookies};
use super::extract::{extract_access_token, extract_refresh_token, RequestCookies, TokenSource};
use crate::config::CookieSettings;

/// Capability interface over a caller's session tokens.
pub trait TokenStore {
    fn access_token(&self) -> Option<&str>;
    fn refresh_token(&self) -> Option<&str>;
    fn set_access_token(&mut self, token: &str);
    /// Forget both tokens and expire every session cookie.
    fn clear(&mut self);
}

/// [`TokenStore`] over the request's cookies and the response's
/// `Set-Cookie` headers.
pub struct CookieTokenStore {
    access: Option<String>,
    refresh: Option<String>,
    pending: HeaderMap,
    settings: CookieSettings,
}

impl CookieTokenStore {
    /// Read the current tokens from request headers (bearer header and
    /// cookies, in the usual priority order).
    pub fn from_headers(headers: &HeaderMap, settings: CookieSettings) -> Self {
        let cookies = RequestCookies::from_headers(headers);
        let source = TokenSource::with_cookies(headers, &cookies);
        Self {
            access: extract_access_token(&source),
            refresh: extract_refresh_token(&source),
            pending: HeaderMap::new(),
            settings,
        }
    }

    /// Store a new refresh token (login only).
    pub fn set_refresh_token(&mut self, token: &str) {
        append_session_cookies(&mut self.pending, None, Some(token), &self.settings);
        self.refresh = Some(token.to_string());
    }

    /// Move pending `Set-Cookie` headers onto a response.
    pub fn apply(self, headers: &mut HeaderMap) {
        for value in self.pending.get_all(SET_COOKIE) {
            headers.append(SET_COOKIE, value.clone());
        }
    }
}

impl TokenStore for CookieTokenStore {
    fn access_token(&self) -> Option<&str> {
        self.access.as_deref()
    }

    fn refresh_token(&self) -> Option<&str> {
        self.refresh.as_deref()
    }

    fn set_access_token(&mut self, token: &str) {
        apply_refreshed_access_cookie(&mut self.pending, Some(token), &self.settings);
        self.access = Some(token.to_string());
    }

    fn clear(&mut self) {
        self.access = None;
        self.refresh = None;
        self.pending = HeaderMap::new();
        clear_session_cookies(&mut self.pending, &self.settings);
    }
}
