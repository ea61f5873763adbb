use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::{
        auth::require_user,
        cookies::{build_cookie, clear_cookie, SESSION_COOKIE, USER_ID_COOKIE},
        rate_limit::check_rate_limit,
    },
    models::{
        auth::AuthenticatedUser,
        user::{
            is_plausible_email, normalize_email, ChangePasswordRequest, LoginRequest, NewUser,
            RegisterRequest, UserProfile,
        },
    },
    routes::parse_json,
    services::{
        metrics::{record_login, TOKENS_ISSUED_COUNTER},
        password,
    },
    AppState,
};

/// Response carrying a fresh session: the signed `jt_session` cookie plus the
/// informational `jt_uid` copy.
fn session_response(
    state: &AppState,
    status: StatusCode,
    user_id: Uuid,
    body: serde_json::Value,
) -> Result<Response, ApiError> {
    let token = state.tokens.issue_session(user_id)?;
    TOKENS_ISSUED_COUNTER.with_label_values(&["session"]).inc();

    let secure = state.config.is_production();
    Ok((
        status,
        AppendHeaders([
            (header::SET_COOKIE, build_cookie(SESSION_COOKIE, &token, true, secure)),
            (header::SET_COOKIE, build_cookie(USER_ID_COOKIE, &user_id.to_string(), false, secure)),
        ]),
        Json(body),
    )
        .into_response())
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    check_rate_limit(&state, &state.config.rate_limits.register, &headers)?;

    let req: RegisterRequest = parse_json(&body)?;
    let email = normalize_email(&req.email);
    if !is_plausible_email(&email) {
        return Err(ApiError::BadRequest("A valid email is required".into()));
    }
    password::check_policy(&req.password).map_err(ApiError::BadRequest)?;

    let password_hash = password::hash_password_blocking(req.password, state.config.bcrypt_cost).await?;
    let user = state
        .store
        .create_user(NewUser {
            email,
            password_hash,
            name: req.name.trim().to_string(),
        })
        .await?;

    tracing::info!(user_id = %user.id, "user registered");
    let user_id = user.id;
    session_response(
        &state,
        StatusCode::CREATED,
        user_id,
        json!({ "user": UserProfile::from(user) }),
    )
}

/// POST /api/auth/login
///
/// Unknown email and wrong password produce the same response and take the
/// same time.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    check_rate_limit(&state, &state.config.rate_limits.login, &headers)?;

    let req: LoginRequest = parse_json(&body)?;
    let email = normalize_email(&req.email);

    let user = state
        .store
        .find_user_by_email(&email)
        .await?;

    let stored_hash = match &user {
        Some(u) => u.password_hash.clone(),
        None => state.dummy_hash.to_string(),
    };
    let valid = password::verify_password_blocking(req.password, stored_hash).await;

    let user = match user {
        Some(u) if valid => u,
        _ => {
            record_login("user", false);
            return Err(ApiError::InvalidCredentials);
        }
    };

    record_login("user", true);
    let user_id = user.id;
    session_response(&state, StatusCode::OK, user_id, json!({ "user": UserProfile::from(user) }))
}

/// POST /api/auth/logout
///
/// Tokens are not revocable; logging out only removes the client's cookies.
pub async fn logout(State(state): State<AppState>) -> Response {
    let secure = state.config.is_production();
    (
        StatusCode::OK,
        AppendHeaders([
            (header::SET_COOKIE, clear_cookie(SESSION_COOKIE, true, secure)),
            (header::SET_COOKIE, clear_cookie(USER_ID_COOKIE, false, secure)),
        ]),
        Json(json!({ "message": "Logged out" })),
    )
        .into_response()
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .store
        .find_user_by_id(user.user_id)
        .await?
        // A valid token for a deleted account
        .ok_or(ApiError::Unauthenticated)?;
    Ok(Json(user.into()))
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    check_rate_limit(&state, &state.config.rate_limits.change_password, &headers)?;
    let caller = require_user(&state, &headers)?;

    let req: ChangePasswordRequest = parse_json(&body)?;
    let user = state
        .store
        .find_user_by_id(caller.user_id)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if !password::verify_password_blocking(req.current_password, user.password_hash).await {
        return Err(ApiError::InvalidCredentials);
    }
    password::check_policy(&req.new_password).map_err(ApiError::BadRequest)?;

    let new_hash = password::hash_password_blocking(req.new_password, state.config.bcrypt_cost).await?;
    state
        .store
        .update_password_hash(user.id, &new_hash)
        .await?;

    tracing::info!(user_id = %user.id, "password changed");
    Ok(Json(json!({ "message": "Password changed" })))
}
