use thiserror::Error;
use uuid::Uuid;

use crate::{
    application::repos::RepoError,
    domain::{error::DomainError, types::PostKind},
};

#[derive(Debug, Clone, Error)]
pub enum PostGatewayError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("sign in to {action}")]
    AuthRequired { action: &'static str },
    #[error("post `{0}` not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Persistence(#[from] RepoError),
}

impl PostGatewayError {
    /// Failures the acting user caused and should be told about.
    pub fn is_actor_facing(&self) -> bool {
        matches!(
            self,
            PostGatewayError::Validation(_) | PostGatewayError::AuthRequired { .. }
        )
    }

    pub(crate) fn outcome_label(&self) -> &'static str {
        match self {
            PostGatewayError::Validation(_) => "validation",
            PostGatewayError::AuthRequired { .. } => "auth_required",
            PostGatewayError::NotFound(_) => "not_found",
            PostGatewayError::Persistence(_) => "persistence",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub team_id: Uuid,
    pub section_id: Option<Uuid>,
    pub kind: PostKind,
    pub title: String,
    /// Rich-text HTML; sanitized before storage.
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct UpdatePostCommand {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
}
