//! Access/refresh token extraction from request headers and cookies.
//!
//! Pure functions of their input: nothing here performs I/O, and a missing
//! token is `None`, never an error.

use std::collections::HashMap;
use std::sync::LazyLock;

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::HeaderMap;
use regex::Regex;
use storefront_core::tokens::{ACCESS_COOKIE_NAMES, BEARER_PREFIX, REFRESH_COOKIE_NAMES};

/// Read access to a structured cookie store.
pub trait CookieReader: Send + Sync {
    /// Value of the named cookie, if present.
    fn get(&self, name: &str) -> Option<&str>;
}

impl CookieReader for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<&str> {
        HashMap::get(self, name).map(String::as_str)
    }
}

/// Cookies parsed from every `Cookie` header of a request.
///
/// When a name repeats, the first occurrence wins (browsers send the most
/// specific path first). Values are percent-decoded where possible.
#[derive(Debug, Clone, Default)]
pub struct RequestCookies(HashMap<String, String>);

impl RequestCookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = HashMap::new();
        for pair in headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
        {
            if let Some((name, value)) = pair.trim().split_once('=') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                cookies
                    .entry(name.to_string())
                    .or_insert_with(|| decode_cookie_value(value.trim()));
            }
        }
        Self(cookies)
    }
}

impl CookieReader for RequestCookies {
    fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Where tokens are looked up: request headers plus, optionally, a
/// structured cookie store.
#[derive(Clone, Copy)]
pub struct TokenSource<'a> {
    headers: &'a HeaderMap,
    cookies: Option<&'a dyn CookieReader>,
}

impl<'a> TokenSource<'a> {
    /// Headers only; cookies are read by scanning the raw `Cookie` header.
    pub fn headers(headers: &'a HeaderMap) -> Self {
        Self {
            headers,
            cookies: None,
        }
    }

    pub fn with_cookies(headers: &'a HeaderMap, cookies: &'a dyn CookieReader) -> Self {
        Self {
            headers,
            cookies: Some(cookies),
        }
    }
}

/// One compiled `(?:^|;\s*)<name>=([^;]+)` pattern per candidate name.
static ACCESS_COOKIE_PATTERNS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_cookie_patterns(&ACCESS_COOKIE_NAMES));

static REFRESH_COOKIE_PATTERNS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile_cookie_patterns(&REFRESH_COOKIE_NAMES));

fn compile_cookie_patterns(names: &[&str]) -> Vec<Regex> {
    names
        .iter()
        .map(|name| {
            Regex::new(&format!(r"(?:^|;\s*){}=([^;]+)", regex::escape(name)))
                .expect("valid regex")
        })
        .collect()
}

/// Locate the access token.
///
/// Order: `Authorization: Bearer <token>` (case-sensitive prefix, value
/// trimmed), then the cookie store, then the raw `Cookie` header, each
/// walking `access_token`, `access`, `token` in that order.
pub fn extract_access_token(source: &TokenSource<'_>) -> Option<String> {
    let bearer = source
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    pick_from_store(source.cookies, &ACCESS_COOKIE_NAMES)
        .or_else(|| pick_from_cookie_header(source.headers, &ACCESS_COOKIE_PATTERNS))
}

/// Locate the refresh token. Cookies only; the `Authorization` header is
/// never consulted.
pub fn extract_refresh_token(source: &TokenSource<'_>) -> Option<String> {
    pick_from_store(source.cookies, &REFRESH_COOKIE_NAMES)
        .or_else(|| pick_from_cookie_header(source.headers, &REFRESH_COOKIE_PATTERNS))
}

fn pick_from_store(store: Option<&dyn CookieReader>, names: &[&str]) -> Option<String> {
    let store = store?;
    names
        .iter()
        .filter_map(|name| store.get(name))
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn pick_from_cookie_header(headers: &HeaderMap, patterns: &[Regex]) -> Option<String> {
    let raw = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");
    if raw.is_empty() {
        return None;
    }
    patterns.iter().find_map(|re| {
        re.captures(&raw)
            .and_then(|c| c.get(1))
            .map(|m| decode_cookie_value(m.as_str()))
    })
}

/// Percent-decode a cookie value, keeping the raw text if it is not valid
/// percent-encoding.
fn decode_cookie_value(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|v| v.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}
