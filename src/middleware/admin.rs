use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::{
    error::ApiError,
    middleware::cookies::{get_cookie, ADMIN_SESSION_COOKIE},
    models::auth::AdminSession,
    AppState,
};

/// Validates the admin session cookie.
///
/// A missing or bad admin token is a 401. A valid *user* session presented
/// to an admin route without an admin token is a 403: the caller is known,
/// just not privileged.
pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<AdminSession, ApiError> {
    if let Some(token) = get_cookie(headers, ADMIN_SESSION_COOKIE) {
        if state.tokens.verify_admin(&token) {
            return Ok(AdminSession);
        }
        return Err(ApiError::Unauthenticated);
    }
    if crate::middleware::auth::require_user(state, headers).is_ok() {
        return Err(ApiError::Forbidden);
    }
    Err(ApiError::Unauthenticated)
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        require_admin(state, &parts.headers)
    }
}
