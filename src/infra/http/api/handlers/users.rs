use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::infra::http::api::error::{ApiError, repo_to_api};
use crate::infra::http::api::state::ApiState;

pub async fn get_user(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state
        .users
        .find_by_id(id)
        .await
        .map_err(repo_to_api)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(profile))
}
