use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::ApiError,
    middleware::{
        auth::require_user,
        extension::{require_api_key, require_extension_user},
        rate_limit::check_rate_limit,
    },
    models::{job::SaveJobRequest, user::UserProfile},
    routes::parse_json,
    services::{metrics::TOKENS_ISSUED_COUNTER, tokens::EXTENSION_TTL_MS},
    AppState,
};

/// POST /api/extension/token
///
/// Issued from the web app with a valid session, then pasted into / fetched by
/// the extension, which presents it as `X-User-Token` from then on.
pub async fn issue_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    check_rate_limit(&state, &state.config.rate_limits.extension_token, &headers)?;
    let user = require_user(&state, &headers)?;

    let token = state.tokens.issue_extension(user.user_id)?;
    TOKENS_ISSUED_COUNTER.with_label_values(&["extension"]).inc();
    tracing::info!(user_id = %user.user_id, "extension token issued");

    Ok(Json(json!({
        "token": token,
        "expires_in": EXTENSION_TTL_MS / 1000,
    })))
}

/// POST /api/extension/verify
pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    check_rate_limit(&state, &state.config.rate_limits.extension_verify, &headers)?;
    require_api_key(&state, &headers)?;
    let caller = require_extension_user(&state, &headers)?;

    let user = state
        .store
        .find_user_by_id(caller.user_id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    Ok(Json(json!({ "user": UserProfile::from(user) })))
}

/// POST /api/extension/jobs
pub async fn save_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    check_rate_limit(&state, &state.config.rate_limits.extension_save_job, &headers)?;
    require_api_key(&state, &headers)?;
    let caller = require_extension_user(&state, &headers)?;

    let req: SaveJobRequest = parse_json(&body)?;
    let job = req.validate().map_err(ApiError::BadRequest)?;

    // The owner is always the token's subject
    let job = state.store.save_job(caller.user_id, job).await?;
    Ok((StatusCode::CREATED, Json(json!({ "job": job }))))
}
