use axum::{extract::State, Json};

use crate::{error::ApiError, models::{auth::AuthenticatedUser, job::Job}, AppState};

/// GET /api/jobs: the caller's saved jobs, newest first.
pub async fn list_jobs(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Job>>, ApiError> {
    Ok(Json(state.store.list_jobs(user.user_id).await?))
}
