use std::sync::Arc;

use metrics::counter;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::actor::Actor;
use crate::application::repos::{
    CreateCommentParams, CreatePostParams, PostsRepo, PostsWriteRepo, RepoError,
    ToggleReactionParams, UpdatePostParams,
};
use crate::domain::entities::{CommentRecord, PostRecord};
use crate::domain::posts::{normalize_comment, normalize_title, sanitize_rich_text};
use crate::domain::reactions::{Reactions, normalize_reaction_key};

use super::types::{CreatePostCommand, PostGatewayError, UpdatePostCommand};

/// One call per mutating verb, each a single round trip to the store.
///
/// Input rules are checked before anything is sent; nothing is retried.
#[derive(Clone)]
pub struct PostGateway {
    pub(crate) reader: Arc<dyn PostsRepo>,
    pub(crate) writer: Arc<dyn PostsWriteRepo>,
}

impl PostGateway {
    pub fn new(reader: Arc<dyn PostsRepo>, writer: Arc<dyn PostsWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn list_team_posts(&self, team_id: Uuid) -> Result<Vec<PostRecord>, RepoError> {
        self.reader.list_by_team(team_id).await
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        self.reader.find_by_id(id).await
    }

    pub async fn create(
        &self,
        actor: Option<&Actor>,
        command: CreatePostCommand,
    ) -> Result<PostRecord, PostGatewayError> {
        let result = self.create_inner(actor, command).await;
        record_outcome("create", &result);
        result
    }

    async fn create_inner(
        &self,
        actor: Option<&Actor>,
        command: CreatePostCommand,
    ) -> Result<PostRecord, PostGatewayError> {
        let title = normalize_title(&command.title)?;
        let actor = actor.ok_or(PostGatewayError::AuthRequired {
            action: "create posts",
        })?;

        let params = CreatePostParams {
            team_id: command.team_id,
            section_id: command.section_id,
            kind: command.kind,
            title,
            description: sanitize_rich_text(&command.description),
            created_by: actor.id,
        };

        let post = self.writer.create_post(params).await?;
        info!(post_id = %post.id, team_id = %post.team_id, "post created");
        Ok(post)
    }

    pub async fn update(&self, command: UpdatePostCommand) -> Result<PostRecord, PostGatewayError> {
        let result = self.update_inner(command).await;
        record_outcome("update", &result);
        result
    }

    async fn update_inner(&self, command: UpdatePostCommand) -> Result<PostRecord, PostGatewayError> {
        let title = command.title.as_deref().map(normalize_title).transpose()?;
        let description = command.description.as_deref().map(sanitize_rich_text);

        let params = UpdatePostParams {
            id: command.id,
            title,
            description,
        };

        self.writer
            .update_post(params)
            .await
            .map_err(|err| not_found_or(command.id, err))
    }

    /// Flip the pin flag. `None` when the post no longer exists.
    pub async fn toggle_pin(&self, id: Uuid) -> Result<Option<PostRecord>, PostGatewayError> {
        let result = match self.writer.toggle_post_pinned(id).await {
            Ok(post) => Ok(Some(post)),
            Err(RepoError::NotFound) => Ok(None),
            Err(err) => Err(PostGatewayError::from(err)),
        };
        record_outcome("toggle_pin", &result);
        result
    }

    /// Toggle the actor's reaction under `emoji`, returning the full reaction map.
    pub async fn react(
        &self,
        actor: Option<&Actor>,
        id: Uuid,
        emoji: &str,
    ) -> Result<Reactions, PostGatewayError> {
        let result = self.react_inner(actor, id, emoji).await;
        record_outcome("react", &result);
        result
    }

    async fn react_inner(
        &self,
        actor: Option<&Actor>,
        id: Uuid,
        emoji: &str,
    ) -> Result<Reactions, PostGatewayError> {
        let actor = actor.ok_or(PostGatewayError::AuthRequired { action: "react" })?;
        let emoji = normalize_reaction_key(emoji)?;

        self.writer
            .toggle_post_reaction(ToggleReactionParams {
                post_id: id,
                emoji,
                user_id: actor.id,
            })
            .await
            .map_err(|err| not_found_or(id, err))
    }

    /// Append a comment, returning every comment of the post.
    pub async fn comment(
        &self,
        actor: Option<&Actor>,
        id: Uuid,
        content: &str,
    ) -> Result<Vec<CommentRecord>, PostGatewayError> {
        let result = self.comment_inner(actor, id, content).await;
        record_outcome("comment", &result);
        result
    }

    async fn comment_inner(
        &self,
        actor: Option<&Actor>,
        id: Uuid,
        content: &str,
    ) -> Result<Vec<CommentRecord>, PostGatewayError> {
        let actor = actor.ok_or(PostGatewayError::AuthRequired { action: "comment" })?;
        let content = normalize_comment(content)?;

        self.writer
            .append_comment(CreateCommentParams {
                post_id: id,
                author_id: actor.id,
                content,
            })
            .await
            .map_err(|err| not_found_or(id, err))
    }

    /// `true` only when the store confirmed the removal.
    pub async fn delete(&self, id: Uuid) -> Result<bool, PostGatewayError> {
        let result = self.writer.delete_post(id).await.map_err(PostGatewayError::from);
        record_outcome("delete", &result);
        result
    }
}

fn not_found_or(id: Uuid, err: RepoError) -> PostGatewayError {
    match err {
        RepoError::NotFound => PostGatewayError::NotFound(id),
        other => PostGatewayError::Persistence(other),
    }
}

fn record_outcome<T>(verb: &'static str, result: &Result<T, PostGatewayError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(err) => {
            if !err.is_actor_facing() {
                warn!(verb, error = %err, "post mutation failed");
            }
            err.outcome_label()
        }
    };
    counter!("teamboard_post_mutation_total", "verb" => verb, "outcome" => outcome).increment(1);
}
