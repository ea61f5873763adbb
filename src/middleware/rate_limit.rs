use axum::http::HeaderMap;

use crate::{
    error::ApiError,
    middleware::client_ip::client_identifier,
    services::{
        metrics::RATE_LIMITED_COUNTER,
        rate_limit::{RateLimitDecision, RateLimitRule},
    },
    AppState,
};

/// Counts the request against `rule` for the calling client.
///
/// Called as the first step of every guarded handler, before any credential
/// is looked at. The slot is consumed even if the request later fails.
pub fn check_rate_limit(
    state: &AppState,
    rule: &RateLimitRule,
    headers: &HeaderMap,
) -> Result<(), ApiError> {
    let client = client_identifier(headers);
    match state.rate_limiter.check_rule(rule, &client) {
        RateLimitDecision::Allow => Ok(()),
        RateLimitDecision::Deny { retry_after_secs } => {
            RATE_LIMITED_COUNTER.with_label_values(&[rule.scope]).inc();
            tracing::warn!(scope = rule.scope, retry_after_secs, "rate limit exceeded");
            Err(ApiError::RateLimited { retry_after_secs })
        }
    }
}
