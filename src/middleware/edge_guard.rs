//! Page-level redirects based on cookie *presence* only.
//!
//! This is a UX shortcut, not a security boundary: a forged cookie gets past
//! it. The API handlers verify tokens through `middleware::auth` and
//! `middleware::admin`, and that is what protects data.

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::middleware::cookies::{has_cookie, ADMIN_SESSION_COOKIE, SESSION_COOKIE};

pub const LOGIN_PAGE: &str = "/login";
pub const DASHBOARD_PAGE: &str = "/dashboard";
pub const ADMIN_HOME_PAGE: &str = "/admin";
pub const ADMIN_LOGIN_PAGE: &str = "/admin/login";

const USER_PAGES: &[&str] = &["/dashboard", "/jobs", "/applications", "/settings"];
const GUEST_PAGES: &[&str] = &["/login", "/register"];

/// Which session cookies a request appears to carry. Grants nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CookiePresence {
    pub session: bool,
    pub admin: bool,
}

impl CookiePresence {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            session: has_cookie(headers, SESSION_COOKIE),
            admin: has_cookie(headers, ADMIN_SESSION_COOKIE),
        }
    }
}

fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Where to send the browser instead of rendering `path`, if anywhere.
pub fn redirect_for(path: &str, cookies: CookiePresence) -> Option<&'static str> {
    if under(path, ADMIN_LOGIN_PAGE) {
        return cookies.admin.then_some(ADMIN_HOME_PAGE);
    }
    if under(path, ADMIN_HOME_PAGE) {
        return (!cookies.admin).then_some(ADMIN_LOGIN_PAGE);
    }
    if GUEST_PAGES.iter().any(|p| under(path, p)) {
        return cookies.session.then_some(DASHBOARD_PAGE);
    }
    if USER_PAGES.iter().any(|p| under(path, p)) {
        return (!cookies.session).then_some(LOGIN_PAGE);
    }
    None
}

pub async fn edge_guard(request: Request, next: Next) -> Response {
    let cookies = CookiePresence::from_headers(request.headers());
    match redirect_for(request.uri().path(), cookies) {
        Some(target) => Redirect::to(target).into_response(),
        None => next.run(request).await,
    }
}
