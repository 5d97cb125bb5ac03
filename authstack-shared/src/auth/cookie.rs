/// Session cookie helpers
///
/// The session token travels in a single cookie:
///
/// ```text
/// Set-Cookie: jwt=<token>; HttpOnly; SameSite=Strict; Secure; Path=/; Max-Age=2592000
/// ```
///
/// `Secure` is dropped in development so the cookie works over plain
/// `http://localhost`.
///
/// # Example
///
/// ```
/// use authstack_shared::auth::cookie::{session_cookie, SESSION_COOKIE};
/// use axum_extra::extract::cookie::CookieJar;
///
/// let jar = CookieJar::new().add(session_cookie("token".to_string(), true));
/// assert_eq!(jar.get(SESSION_COOKIE).map(|c| c.value()), Some("token"));
/// ```

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::OffsetDateTime;

use super::jwt::SESSION_TTL_DAYS;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "jwt";

fn base_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .build()
}

/// Builds the cookie carrying a freshly issued session token
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(token, secure);
    cookie.set_max_age(time::Duration::days(SESSION_TTL_DAYS));
    cookie
}

/// Builds a cookie that overwrites and immediately expires the session cookie
pub fn cleared_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = base_cookie(String::new(), secure);
    cookie.set_max_age(time::Duration::ZERO);
    cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
    cookie
}

/// Reads the session token from request headers
///
/// An empty cookie value counts as no token.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
