use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::{PostRecord, UserProfile};
use crate::domain::reactions::DEFAULT_REACTION;
use crate::domain::types::PostKind;

fn default_reaction_key() -> String {
    DEFAULT_REACTION.to_string()
}

#[derive(Debug, Default, Deserialize)]
pub struct FeedListQuery {
    pub section: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub posts: Vec<PostRecord>,
    /// Profiles of the post authors that could be resolved.
    pub authors: Vec<UserProfile>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PostCreateRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: PostKind,
    #[serde(default)]
    pub section_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PostUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ReactionRequest {
    #[serde(default = "default_reaction_key")]
    pub emoji: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}
