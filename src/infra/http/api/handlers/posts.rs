use std::collections::HashSet;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::feed::{FeedQuery, ProfileCache};
use crate::application::posts::{CreatePostCommand, UpdatePostCommand};
use crate::domain::entities::PostRecord;
use crate::domain::types::{SectionFilter, SortOption};
use crate::infra::http::CurrentActor;
use crate::infra::http::api::error::{ApiError, gateway_to_api, repo_to_api};
use crate::infra::http::api::models::{
    CommentRequest, DeleteResponse, FeedListQuery, FeedResponse, PostCreateRequest,
    PostUpdateRequest, ReactionRequest,
};
use crate::infra::http::api::state::ApiState;

pub async fn list_team_posts(
    State(state): State<ApiState>,
    Path(team_id): Path<Uuid>,
    Query(params): Query<FeedListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let section = SectionFilter::from_param(params.section.as_deref().unwrap_or(""))
        .map_err(|err| ApiError::bad_request("Invalid section", Some(err.to_string())))?;
    let query = FeedQuery {
        section,
        search: params.search.unwrap_or_default(),
        sort: SortOption::from_param(params.sort.as_deref().unwrap_or("")),
    };

    let posts = state
        .posts
        .list_team_posts(team_id)
        .await
        .map_err(repo_to_api)?;
    let visible: Vec<PostRecord> = query.apply(&posts).into_iter().cloned().collect();

    let mut seen = HashSet::new();
    let author_ids: Vec<Uuid> = visible
        .iter()
        .map(|post| post.created_by)
        .filter(|id| seen.insert(*id))
        .collect();

    let profiles = ProfileCache::new();
    profiles
        .ensure_loaded(
            state.users.as_ref(),
            author_ids.iter().copied(),
            state.profile_concurrency,
        )
        .await;
    let authors = author_ids
        .into_iter()
        .filter_map(|id| profiles.get(id))
        .collect();

    Ok(Json(FeedResponse {
        posts: visible,
        authors,
    }))
}

pub async fn get_post(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .posts
        .find(id)
        .await
        .map_err(repo_to_api)?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;
    Ok(Json(post))
}

pub async fn create_post(
    State(state): State<ApiState>,
    CurrentActor(actor): CurrentActor,
    Path(team_id): Path<Uuid>,
    Json(payload): Json<PostCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreatePostCommand {
        team_id,
        section_id: payload.section_id,
        kind: payload.kind,
        title: payload.title,
        description: payload.description,
    };

    let post = state
        .posts
        .create(actor.as_ref(), command)
        .await
        .map_err(gateway_to_api)?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = UpdatePostCommand {
        id,
        title: payload.title,
        description: payload.description,
    };

    let post = state.posts.update(command).await.map_err(gateway_to_api)?;
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.posts.delete(id).await.map_err(gateway_to_api)?;
    Ok(Json(DeleteResponse { deleted }))
}

pub async fn toggle_pin(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .posts
        .toggle_pin(id)
        .await
        .map_err(gateway_to_api)?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;
    Ok(Json(post))
}

pub async fn toggle_reaction(
    State(state): State<ApiState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let reactions = state
        .posts
        .react(actor.as_ref(), id, &payload.emoji)
        .await
        .map_err(gateway_to_api)?;
    Ok(Json(reactions))
}

pub async fn add_comment(
    State(state): State<ApiState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state
        .posts
        .comment(actor.as_ref(), id, &payload.content)
        .await
        .map_err(gateway_to_api)?;
    Ok(Json(comments))
}
