pub mod admin;
pub mod auth;
pub mod extension;
pub mod health;
pub mod jobs;
pub mod metrics;
pub mod pages;

use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Bodies are parsed only after the rate limiter and credential checks, so a
/// flood of junk bodies still burns rate-limit slots.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError::BadRequest("Invalid or missing JSON body".into()))
}
