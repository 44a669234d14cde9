//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::agile::{AgileMemberRecord, AgileRoleRecord, SprintPlanRecord, TeamAgileRecord};
use crate::domain::entities::{CommentRecord, PostRecord, UserProfile};
use crate::domain::reactions::Reactions;
use crate::domain::types::PostKind;

#[derive(Debug, Clone, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub team_id: Uuid,
    pub section_id: Option<Uuid>,
    pub kind: PostKind,
    pub title: String,
    pub description: String,
    pub created_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateCommentParams {
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct ToggleReactionParams {
    pub post_id: Uuid,
    pub emoji: String,
    pub user_id: Uuid,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Every post of a team with its comments, ordered by `created_at` ascending.
    async fn list_by_team(&self, team_id: Uuid) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    /// Flip `is_pinned`; `RepoError::NotFound` when the post is gone.
    async fn toggle_post_pinned(&self, id: Uuid) -> Result<PostRecord, RepoError>;

    /// Atomically flip the user's membership under `emoji` and return the stored map.
    async fn toggle_post_reaction(
        &self,
        params: ToggleReactionParams,
    ) -> Result<Reactions, RepoError>;

    /// Append a comment and return every comment of the post, oldest first.
    async fn append_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<Vec<CommentRecord>, RepoError>;

    /// Returns `false` when no row matched.
    async fn delete_post(&self, id: Uuid) -> Result<bool, RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, RepoError>;

    /// Batch lookup with a single `IN` query; unknown ids are simply absent.
    async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserProfile>, RepoError>;
}

#[async_trait]
pub trait AgileRepo: Send + Sync {
    /// Ordered by `created_at` descending.
    async fn list_team_agile(&self, team_id: Uuid) -> Result<Vec<TeamAgileRecord>, RepoError>;

    /// Ordered by `created_at` ascending.
    async fn list_roles(&self, team_id: Uuid) -> Result<Vec<AgileRoleRecord>, RepoError>;

    /// Ordered by `created_at` ascending.
    async fn list_sprint_plans(&self, team_id: Uuid) -> Result<Vec<SprintPlanRecord>, RepoError>;

    async fn find_role(&self, id: Uuid) -> Result<Option<AgileRoleRecord>, RepoError>;

    /// Ordered by `created_at` ascending, never enriched.
    async fn list_members(&self, agile_id: Uuid) -> Result<Vec<AgileMemberRecord>, RepoError>;
}
