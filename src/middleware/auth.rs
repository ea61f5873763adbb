use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::{
    error::ApiError,
    middleware::cookies::{get_cookie, SESSION_COOKIE},
    models::auth::AuthenticatedUser,
    AppState,
};

/// Resolve the caller from the signed session cookie. The plain `jt_uid`
/// cookie is never read here.
pub fn require_user(state: &AppState, headers: &HeaderMap) -> Result<AuthenticatedUser, ApiError> {
    let token = get_cookie(headers, SESSION_COOKIE).ok_or(ApiError::Unauthenticated)?;
    let user_id = state
        .tokens
        .verify_session(&token)
        .ok_or(ApiError::Unauthenticated)?;
    Ok(AuthenticatedUser { user_id })
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        require_user(state, &parts.headers)
    }
}
