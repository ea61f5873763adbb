use axum::http::{header, HeaderMap};

pub const SESSION_COOKIE: &str = "jt_session";
/// Convenience copy of the session subject for client-side code. Never read
/// as a trust input.
pub const USER_ID_COOKIE: &str = "jt_uid";
pub const ADMIN_SESSION_COOKIE: &str = "jt_admin_session";

/// 30 days, matching the session token lifetime.
pub const SESSION_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

/// Extract a named cookie value from request headers.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|part| {
            part.trim()
                .strip_prefix(&prefix)
                .map(str::to_string)
        })
}

/// True when the cookie is present with a non-empty value. Says nothing about
/// whether the value is genuine.
pub fn has_cookie(headers: &HeaderMap, name: &str) -> bool {
    get_cookie(headers, name).is_some_and(|v| !v.is_empty())
}

/// `Set-Cookie` value for a 30-day cookie at path `/`.
pub fn build_cookie(name: &str, value: &str, http_only: bool, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; Path=/; SameSite=Lax; Max-Age={SESSION_MAX_AGE_SECS}");
    if http_only {
        cookie.push_str("; HttpOnly");
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that deletes the cookie on the client.
pub fn clear_cookie(name: &str, http_only: bool, secure: bool) -> String {
    let mut cookie = format!("{name}=; Path=/; SameSite=Lax; Max-Age=0");
    if http_only {
        cookie.push_str("; HttpOnly");
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
