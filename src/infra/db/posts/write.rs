use async_trait::async_trait;
use sqlx::types::Json;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::application::repos::{
    CreateCommentParams, CreatePostParams, PostsWriteRepo, RepoError, ToggleReactionParams,
    UpdatePostParams,
};
use crate::domain::entities::{CommentRecord, PostRecord};
use crate::domain::reactions::Reactions;

use super::PostgresRepositories;
use super::types::{POST_COLUMNS, PostRow};
use crate::infra::db::map_sqlx_error;

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            team_id,
            section_id,
            kind,
            title,
            description,
            created_by,
        } = params;

        let id = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();
        let sql = format!(
            r#"
            INSERT INTO posts (
                id, team_id, section_id, kind, title, description,
                is_pinned, reactions, created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, '{{}}'::jsonb, $7, $8, $8)
            RETURNING {POST_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(team_id)
            .bind(section_id)
            .bind(kind)
            .bind(title)
            .bind(description)
            .bind(created_by)
            .bind(now)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into_record(Vec::new()))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let UpdatePostParams {
            id,
            title,
            description,
        } = params;

        let now = OffsetDateTime::now_utc();
        let sql = format!(
            r#"
            UPDATE posts
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = $4
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(title)
            .bind(description)
            .bind(now)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        self.with_comments(row).await
    }

    async fn toggle_post_pinned(&self, id: Uuid) -> Result<PostRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let sql = format!(
            r#"
            UPDATE posts
            SET is_pinned = NOT is_pinned,
                updated_at = $2
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(now)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        self.with_comments(row).await
    }

    async fn toggle_post_reaction(
        &self,
        params: ToggleReactionParams,
    ) -> Result<Reactions, RepoError> {
        let ToggleReactionParams {
            post_id,
            emoji,
            user_id,
        } = params;

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let current = sqlx::query_scalar::<_, Json<Reactions>>(
            "SELECT reactions FROM posts WHERE id = $1 FOR UPDATE",
        )
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        let updated = current.0.toggled(&emoji, user_id);

        sqlx::query("UPDATE posts SET reactions = $2, updated_at = $3 WHERE id = $1")
            .bind(post_id)
            .bind(Json(&updated))
            .bind(OffsetDateTime::now_utc())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        debug!(post_id = %post_id, emoji = %emoji, "reaction toggled");
        Ok(updated)
    }

    async fn append_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<Vec<CommentRecord>, RepoError> {
        let CreateCommentParams {
            post_id,
            author_id,
            content,
        } = params;

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        if exists.is_none() {
            return Err(RepoError::NotFound);
        }

        sqlx::query(
            r#"
            INSERT INTO post_comments (id, post_id, author_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(author_id)
        .bind(content)
        .bind(OffsetDateTime::now_utc())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let comments = Self::comments_for(&mut *tx, &[post_id]).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(comments.into_iter().map(CommentRecord::from).collect())
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
