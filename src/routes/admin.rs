use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::{
    error::ApiError,
    middleware::{
        admin::require_admin,
        cookies::{build_cookie, clear_cookie, ADMIN_SESSION_COOKIE},
        rate_limit::check_rate_limit,
    },
    models::auth::AdminSession,
    routes::parse_json,
    services::{
        metrics::{record_login, TOKENS_ISSUED_COUNTER},
        password,
    },
    AppState,
};

#[derive(Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct PutSettingRequest {
    pub key: String,
    pub value: String,
}

/// Compares digests so the timing depends on neither input's length.
fn username_matches(provided: &str, expected: &str) -> bool {
    let provided = Sha256::digest(provided.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    bool::from(provided.as_slice().ct_eq(expected.as_slice()))
}

/// POST /api/admin/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    check_rate_limit(&state, &state.config.rate_limits.admin_login, &headers)?;

    let account = state
        .admin
        .clone()
        .ok_or(ApiError::Misconfigured("ADMIN_USERNAME / ADMIN_PASSWORD_HASH"))?;

    let req: AdminLoginRequest = parse_json(&body)?;

    // Always pay for the hash, whatever the username
    let password_ok =
        password::verify_password_blocking(req.password, account.password_hash.clone()).await;
    let username_ok = username_matches(&req.username, &account.username);

    if !(password_ok && username_ok) {
        record_login("admin", false);
        tracing::warn!("admin login failed");
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.tokens.issue_admin()?;
    TOKENS_ISSUED_COUNTER.with_label_values(&["admin"]).inc();
    record_login("admin", true);
    tracing::info!("admin logged in");

    let cookie = build_cookie(ADMIN_SESSION_COOKIE, &token, true, state.config.is_production());
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "admin": true })),
    )
        .into_response())
}

/// POST /api/admin/logout
pub async fn logout(State(state): State<AppState>) -> Response {
    let cookie = clear_cookie(ADMIN_SESSION_COOKIE, true, state.config.is_production());
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "message": "Logged out" })),
    )
        .into_response()
}

/// GET /api/admin/session
pub async fn session(_admin: AdminSession) -> Json<Value> {
    Json(json!({ "admin": true }))
}

/// GET /api/admin/settings
pub async fn list_settings(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    Ok(Json(state.store.list_settings().await?))
}

/// PUT /api/admin/settings
pub async fn put_setting(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    check_rate_limit(&state, &state.config.rate_limits.admin_settings, &headers)?;
    require_admin(&state, &headers)?;

    let req: PutSettingRequest = parse_json(&body)?;
    let key = req.key.trim();
    if key.is_empty() || key.len() > 100 {
        return Err(ApiError::BadRequest("key must be 1-100 characters".into()));
    }
    if req.value.len() > 10_000 {
        return Err(ApiError::BadRequest("value is too long".into()));
    }

    state.store.put_setting(key, &req.value).await?;
    tracing::info!(key, "setting updated");
    Ok(Json(json!({ "key": key, "value": req.value })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_matches() {
        assert!(username_matches("admin", "admin"));
        assert!(!username_matches("admin", "Admin"));
        assert!(!username_matches("adm", "admin"));
        assert!(!username_matches("", "admin"));
        assert!(!username_matches("administrator", "admin"));
    }
}
