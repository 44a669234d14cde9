//! Client-side feed engine: local post state, display ordering and the
//! per-view session that applies confirmed mutation results.

mod ordering;
mod profiles;
mod session;
mod store;
mod view;

pub use ordering::{FeedQuery, order};
pub use profiles::ProfileCache;
pub use session::{
    DeleteOutcome, FeedActionError, FeedSession, FeedSessionDeps, MutationField, Notice,
    NoticeKind,
};
pub use store::{FeedStore, fetch_team_posts};
pub use view::FeedViewState;

use thiserror::Error;

use crate::application::repos::RepoError;

#[derive(Debug, Clone, Error)]
pub enum FeedError {
    #[error("no team selected")]
    MissingTeam,
    #[error("failed to fetch posts: {0}")]
    Fetch(#[source] RepoError),
}
