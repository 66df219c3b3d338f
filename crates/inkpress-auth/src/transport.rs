//! Token transport: cookies and the `Authorization` header.
//!
//! The access token travels in either an HTTP-only cookie or an
//! `Authorization: Bearer` header; the header wins when both are present,
//! since API clients and browser pages use different channels. The refresh
//! token travels *only* in an HTTP-only cookie: it is never read from a
//! header, which keeps the long-lived credential out of script reach and
//! out of request logs.
//!
//! Clearing is idempotent: expiring cookies that are not set is not an
//! error.

use axum::http::{HeaderMap, header::AUTHORIZATION, header::COOKIE};
use cookie::{Cookie, SameSite};
use time::Duration;

use crate::config::CookieConfig;
use crate::session::Session;

/// Reads the access token from a request, header first.
#[must_use]
pub fn read_access_token(headers: &HeaderMap, config: &CookieConfig) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_value(headers, &config.access_name))
}

/// Reads the refresh token from a request. Cookie only, never the header.
#[must_use]
pub fn read_refresh_token(headers: &HeaderMap, config: &CookieConfig) -> Option<String> {
    cookie_value(headers, &config.refresh_name)
}

/// Builds the `Set-Cookie` values that store a session in the browser.
///
/// Both cookies are HTTP-only. The access cookie's Max-Age mirrors the
/// token lifetime so stale cookies age out of the browser on their own; the
/// refresh cookie is a session-spanning credential and keeps the browser
/// default unless the token itself expires first server-side.
#[must_use]
pub fn session_cookies(session: &Session, config: &CookieConfig) -> Vec<String> {
    let now = time::OffsetDateTime::now_utc();
    let access_max_age = (session.access_token_expires_at - now).max(Duration::ZERO);

    let access = build_cookie(
        config,
        &config.access_name,
        &session.access_token,
        &config.access_path,
    )
    .max_age(access_max_age)
    .build();

    let refresh = build_cookie(
        config,
        &config.refresh_name,
        &session.refresh_token,
        &config.refresh_path,
    )
    .build();

    vec![access.to_string(), refresh.to_string()]
}

/// Builds the `Set-Cookie` values that clear a session.
///
/// Safe to send when no session exists.
#[must_use]
pub fn clear_session_cookies(config: &CookieConfig) -> Vec<String> {
    let access = build_cookie(config, &config.access_name, "", &config.access_path)
        .max_age(Duration::ZERO)
        .build();
    let refresh = build_cookie(config, &config.refresh_name, "", &config.refresh_path)
        .max_age(Duration::ZERO)
        .build();

    vec![access.to_string(), refresh.to_string()]
}

fn build_cookie(
    config: &CookieConfig,
    name: &str,
    value: &str,
    path: &str,
) -> cookie::CookieBuilder<'static> {
    Cookie::build((name.to_string(), value.to_string()))
        .http_only(true)
        .secure(config.secure)
        .same_site(same_site(config))
        .path(path.to_string())
}

fn same_site(config: &CookieConfig) -> SameSite {
    match config.same_site.to_ascii_lowercase().as_str() {
        "strict" => SameSite::Strict,
        "none" => SameSite::None,
        _ => SameSite::Lax,
    }
}

/// Extracts a Bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
}

/// Extracts a named cookie's value from the `Cookie` header.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(COOKIE)?.to_str().ok()?;

    for cookie in cookie_header.split(';') {
        let cookie = cookie.trim();
        if let Some((cookie_name, value)) = cookie.split_once('=')
            && cookie_name.trim() == name
        {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    None
}

// =============================================================================
// Tests
// =============================================================================
