use async_trait::async_trait;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::entities::{CommentRecord, PostRecord};

use super::PostgresRepositories;
use super::types::{CommentRow, POST_COLUMNS, PostRow, assemble};
use crate::infra::db::map_sqlx_error;

impl PostgresRepositories {
    pub(crate) async fn comments_for<'e, E>(
        executor: E,
        post_ids: &[Uuid],
    ) -> Result<Vec<CommentRow>, RepoError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, post_id, author_id, content, created_at
            FROM post_comments
            WHERE post_id = ANY($1)
            ORDER BY seq ASC
            "#,
        )
        .bind(post_ids)
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)
    }

    pub(crate) async fn with_comments(&self, row: PostRow) -> Result<PostRecord, RepoError> {
        let comments = Self::comments_for(self.pool(), &[row.id]).await?;
        Ok(row.into_record(comments.into_iter().map(CommentRecord::from).collect()))
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_by_team(&self, team_id: Uuid) -> Result<Vec<PostRecord>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE team_id = $1 ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(team_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let comments = Self::comments_for(self.pool(), &ids).await?;
        Ok(assemble(rows, comments))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => self.with_comments(row).await.map(Some),
            None => Ok(None),
        }
    }
}
