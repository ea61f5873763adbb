use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

use crate::{error::ApiError, models::auth::ExtensionUser, AppState};

/// Static shared secret sent by the extension.
pub const API_KEY_HEADER: &str = "x-api-key";
/// Per-user extension token.
pub const USER_TOKEN_HEADER: &str = "x-user-token";

/// Checks the `X-Api-Key` header.
///
/// A configured key is always enforced. With no key configured, production
/// refuses every request and development lets them through.
pub fn require_api_key(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.config.extension_api_key.as_deref() else {
        if state.config.is_production() {
            return Err(ApiError::Misconfigured("EXTENSION_API_KEY"));
        }
        return Ok(());
    };

    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthenticated)?;

    if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(ApiError::Unauthenticated)
    }
}

/// Resolves the caller from `X-User-Token`. The user id comes from the token
/// alone; nothing else in the request can influence it.
pub fn require_extension_user(state: &AppState, headers: &HeaderMap) -> Result<ExtensionUser, ApiError> {
    let token = headers
        .get(USER_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthenticated)?;
    let user_id = state
        .tokens
        .verify_extension(token)
        .ok_or(ApiError::Unauthenticated)?;
    Ok(ExtensionUser { user_id })
}
