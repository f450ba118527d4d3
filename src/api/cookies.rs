//! Auth cookie helpers
//!
//! Both tokens travel in `HttpOnly` cookies scoped to the whole site. The
//! `Secure` attribute is only added in production so local HTTP works.

use axum::http::{header, HeaderMap, HeaderValue};

use crate::api::middleware::ApiError;
use crate::services::token::{TokenPair, ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS};

/// Cookie holding the 15 minute access token
pub const ACCESS_COOKIE: &str = "accessToken";

/// Cookie holding the 7 day refresh token
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Format a `Set-Cookie` value
pub fn format_cookie(name: &str, value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Strict; Max-Age={}",
        name, value, max_age
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` headers carrying a freshly issued token pair
pub fn auth_cookies(pair: &TokenPair, secure: bool) -> Result<HeaderMap, ApiError> {
    set_cookie_headers([
        format_cookie(ACCESS_COOKIE, &pair.access_token, ACCESS_TOKEN_TTL_SECS, secure),
        format_cookie(REFRESH_COOKIE, &pair.refresh_token, REFRESH_TOKEN_TTL_SECS, secure),
    ])
}

/// `Set-Cookie` headers that expire both auth cookies
pub fn cleared_cookies(secure: bool) -> Result<HeaderMap, ApiError> {
    set_cookie_headers([
        format_cookie(ACCESS_COOKIE, "", 0, secure),
        format_cookie(REFRESH_COOKIE, "", 0, secure),
    ])
}

fn set_cookie_headers(cookies: [String; 2]) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    for cookie in cookies {
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| ApiError::internal_error(format!("Invalid cookie value: {}", e)))?;
        headers.append(header::SET_COOKIE, value);
    }
    Ok(headers)
}

/// Read a cookie from the request's `Cookie` headers
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
