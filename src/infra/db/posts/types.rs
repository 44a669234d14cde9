use std::collections::HashMap;

use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::{CommentRecord, PostRecord};
use crate::domain::reactions::Reactions;
use crate::domain::types::PostKind;

pub(crate) const POST_COLUMNS: &str = "id, team_id, section_id, kind, title, description, \
     is_pinned, reactions, created_by, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: Uuid,
    pub(crate) team_id: Uuid,
    pub(crate) section_id: Option<Uuid>,
    pub(crate) kind: PostKind,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) is_pinned: bool,
    pub(crate) reactions: Json<Reactions>,
    pub(crate) created_by: Uuid,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl PostRow {
    pub(crate) fn into_record(self, comments: Vec<CommentRecord>) -> PostRecord {
        PostRecord {
            id: self.id,
            team_id: self.team_id,
            section_id: self.section_id,
            kind: self.kind,
            title: self.title,
            description: self.description,
            is_pinned: self.is_pinned,
            reactions: self.reactions.0,
            comments,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct CommentRow {
    pub(crate) id: Uuid,
    pub(crate) post_id: Uuid,
    pub(crate) author_id: Uuid,
    pub(crate) content: String,
    pub(crate) created_at: OffsetDateTime,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// Attach comments to their posts, keeping both orders.
pub(crate) fn assemble(rows: Vec<PostRow>, comments: Vec<CommentRow>) -> Vec<PostRecord> {
    let mut by_post: HashMap<Uuid, Vec<CommentRecord>> = HashMap::new();
    for comment in comments {
        by_post
            .entry(comment.post_id)
            .or_default()
            .push(CommentRecord::from(comment));
    }

    rows.into_iter()
        .map(|row| {
            let comments = by_post.remove(&row.id).unwrap_or_default();
            row.into_record(comments)
        })
        .collect()
}
