use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use metrics::counter;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::actor::ActorSource;
use crate::application::confirm::{ConfirmDecision, ConfirmPrompt, ConfirmationService};
use crate::application::posts::{
    CreatePostCommand, PostGateway, PostGatewayError, UpdatePostCommand,
};
use crate::application::repos::UsersRepo;
use crate::domain::entities::{CommentRecord, PostRecord, UserProfile};
use crate::domain::reactions::Reactions;
use crate::domain::types::{PostKind, SectionFilter, SortOption};

use super::profiles::ProfileCache;
use super::store::{FeedStore, fetch_team_posts};
use super::view::FeedViewState;
use super::FeedError;

/// A post field with at most one outstanding mutation per post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationField {
    Pin,
    Reactions,
    Comments,
    Content,
    Delete,
}

impl MutationField {
    pub fn as_str(self) -> &'static str {
        match self {
            MutationField::Pin => "pin",
            MutationField::Reactions => "reactions",
            MutationField::Comments => "comments",
            MutationField::Content => "content",
            MutationField::Delete => "delete",
        }
    }
}

impl fmt::Display for MutationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
pub enum FeedActionError {
    #[error(transparent)]
    Gateway(#[from] PostGatewayError),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("post `{post_id}` already has a pending {field} change")]
    InFlight { post_id: Uuid, field: MutationField },
    #[error("the feed view has been closed")]
    Disposed,
    #[error("post `{0}` is not in this feed")]
    UnknownPost(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    AuthRequired,
    Validation,
}

/// A message shown to the acting user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The store reported nothing was removed; local state is untouched.
    NotDeleted,
    Cancelled,
}

pub struct FeedSessionDeps {
    pub gateway: PostGateway,
    pub users: Arc<dyn UsersRepo>,
    pub actor: Arc<dyn ActorSource>,
    pub confirm: Arc<dyn ConfirmationService>,
    pub profile_concurrency: usize,
}

#[derive(Default)]
struct SessionState {
    store: FeedStore,
    view: FeedViewState,
    loading: bool,
    disposed: bool,
    in_flight: HashSet<(Uuid, MutationField)>,
    notices: Vec<Notice>,
}

struct SessionInner {
    team_id: Option<Uuid>,
    deps: FeedSessionDeps,
    profiles: ProfileCache,
    state: Mutex<SessionState>,
}

/// One mounted feed view: its posts, display state and author profiles.
///
/// Every mutation result is applied only after the store confirms it. Once
/// [`FeedSession::dispose`] has run, results that arrive late are dropped.
#[derive(Clone)]
pub struct FeedSession {
    inner: Arc<SessionInner>,
}

struct InFlightGuard<'a> {
    inner: &'a SessionInner,
    key: (Uuid, MutationField),
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.inner.state().in_flight.remove(&self.key);
    }
}

impl SessionInner {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl FeedSession {
    pub fn new(team_id: Option<Uuid>, deps: FeedSessionDeps) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                team_id,
                deps,
                profiles: ProfileCache::new(),
                state: Mutex::new(SessionState::default()),
            }),
        }
    }

    pub fn team_id(&self) -> Option<Uuid> {
        self.inner.team_id
    }

    /// Fetch the team's posts, replace local state and warm the author cache.
    pub async fn load(&self) -> Result<usize, FeedActionError> {
        {
            let mut state = self.inner.state();
            if state.disposed {
                return Err(FeedActionError::Disposed);
            }
            state.loading = true;
        }

        let fetched =
            fetch_team_posts(self.inner.deps.gateway.reader.as_ref(), self.inner.team_id).await;

        let authors: Vec<Uuid> = {
            let mut state = self.inner.state();
            state.loading = false;
            if state.disposed {
                discard_stale("load");
                return Err(FeedActionError::Disposed);
            }
            let posts = match fetched {
                Ok(posts) => posts,
                Err(err) => {
                    warn!(team_id = ?self.inner.team_id, error = %err, "failed to load feed");
                    return Err(err.into());
                }
            };
            if let Some(team_id) = self.inner.team_id {
                state.store.replace(team_id, posts);
            }
            state.store.posts().iter().map(|post| post.created_by).collect()
        };

        let loaded = authors.len();
        self.inner
            .profiles
            .ensure_loaded(
                self.inner.deps.users.as_ref(),
                authors,
                self.inner.deps.profile_concurrency,
            )
            .await;
        self.ensure_still_open("load")?;
        debug!(team_id = ?self.inner.team_id, posts = loaded, "feed loaded");
        Ok(loaded)
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state().loading
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state().disposed
    }

    /// Posts in display order for the current view state.
    pub fn visible_posts(&self) -> Vec<PostRecord> {
        let state = self.inner.state();
        state
            .view
            .query()
            .apply(state.store.posts())
            .into_iter()
            .cloned()
            .collect()
    }

    /// Posts in insertion order.
    pub fn posts(&self) -> Vec<PostRecord> {
        self.inner.state().store.posts().to_vec()
    }

    pub fn post(&self, post_id: Uuid) -> Option<PostRecord> {
        self.inner.state().store.get(post_id).cloned()
    }

    pub fn view(&self) -> FeedViewState {
        self.inner.state().view.clone()
    }

    pub fn set_section(&self, section: SectionFilter) {
        self.inner.state().view.set_section(section);
    }

    pub fn set_sort(&self, sort: SortOption) {
        self.inner.state().view.set_sort(sort);
    }

    pub fn set_search(&self, search: impl Into<String>) {
        self.inner.state().view.set_search(search);
    }

    pub fn toggle_expanded(&self, post_id: Uuid) -> bool {
        self.inner.state().view.toggle_expanded(post_id)
    }

    pub fn profile(&self, user_id: Uuid) -> Option<UserProfile> {
        self.inner.profiles.get(user_id)
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.inner.state().notices)
    }

    /// Close the view. Outstanding results are discarded from now on.
    pub fn dispose(&self) {
        let mut state = self.inner.state();
        state.disposed = true;
        state.notices.clear();
        self.inner.profiles.close();
    }

    pub async fn create_post(
        &self,
        section_id: Option<Uuid>,
        kind: PostKind,
        title: &str,
        description: &str,
    ) -> Result<PostRecord, FeedActionError> {
        self.ensure_open()?;
        let team_id = self.inner.team_id.ok_or(FeedError::MissingTeam)?;
        let actor = self.inner.deps.actor.current_actor();

        let command = CreatePostCommand {
            team_id,
            section_id,
            kind,
            title: title.to_string(),
            description: description.to_string(),
        };
        let result = self.inner.deps.gateway.create(actor.as_ref(), command).await;
        let post = self.finish("create", result, |state, post| {
            state.store.append(post.clone());
        })?;

        self.inner
            .profiles
            .ensure_loaded(self.inner.deps.users.as_ref(), [post.created_by], 1)
            .await;
        self.ensure_still_open("create")?;
        Ok(post)
    }

    pub async fn update_post(
        &self,
        post_id: Uuid,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<PostRecord, FeedActionError> {
        let _guard = self.begin(post_id, MutationField::Content)?;
        let command = UpdatePostCommand {
            id: post_id,
            title,
            description,
        };
        let result = self.inner.deps.gateway.update(command).await;
        self.finish("update", result, |state, post| {
            state.store.apply_update(post);
        })
    }

    /// Toggle the pin flag. Returns `false` when the post no longer exists remotely.
    pub async fn toggle_pin(&self, post_id: Uuid) -> Result<bool, FeedActionError> {
        let _guard = self.begin(post_id, MutationField::Pin)?;
        let result = self.inner.deps.gateway.toggle_pin(post_id).await;
        let updated = self.finish("toggle_pin", result, |state, updated| {
            state.store.apply_pin_result(post_id, updated.as_ref());
        })?;
        Ok(updated.is_some())
    }

    pub async fn react(&self, post_id: Uuid, emoji: &str) -> Result<Reactions, FeedActionError> {
        let _guard = self.begin(post_id, MutationField::Reactions)?;
        let actor = self.inner.deps.actor.current_actor();
        let result = self
            .inner
            .deps
            .gateway
            .react(actor.as_ref(), post_id, emoji)
            .await;
        self.finish("react", result, |state, reactions| {
            state.store.apply_reaction_result(post_id, reactions.clone());
        })
    }

    pub async fn comment(
        &self,
        post_id: Uuid,
        content: &str,
    ) -> Result<Vec<CommentRecord>, FeedActionError> {
        let _guard = self.begin(post_id, MutationField::Comments)?;
        let actor = self.inner.deps.actor.current_actor();
        let result = self
            .inner
            .deps
            .gateway
            .comment(actor.as_ref(), post_id, content)
            .await;
        self.finish("comment", result, |state, comments| {
            state.store.apply_comment_result(post_id, comments.clone());
        })
    }

    /// Ask for confirmation, then delete. Local removal only follows a confirmed delete.
    pub async fn delete_post(&self, post_id: Uuid) -> Result<DeleteOutcome, FeedActionError> {
        let _guard = self.begin(post_id, MutationField::Delete)?;
        let title = self
            .post(post_id)
            .map(|post| post.title)
            .unwrap_or_default();

        let prompt = ConfirmPrompt::destructive(
            "Delete post",
            format!("\"{title}\" will be removed for everyone on the team."),
        );
        if self.inner.deps.confirm.confirm(prompt).await == ConfirmDecision::Cancelled {
            debug!(post_id = %post_id, "post deletion cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }
        self.ensure_open()?;

        let result = self.inner.deps.gateway.delete(post_id).await;
        let deleted = self.finish("delete", result, |state, deleted| {
            if *deleted {
                state.store.remove(post_id);
                state.view.forget(post_id);
            }
        })?;

        if deleted {
            info!(post_id = %post_id, "post removed from feed");
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotDeleted)
        }
    }

    fn ensure_open(&self) -> Result<(), FeedActionError> {
        if self.inner.state().disposed {
            Err(FeedActionError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Re-check after an await whose result has already been applied.
    fn ensure_still_open(&self, verb: &'static str) -> Result<(), FeedActionError> {
        if self.inner.state().disposed {
            discard_stale(verb);
            return Err(FeedActionError::Disposed);
        }
        Ok(())
    }

    fn begin(
        &self,
        post_id: Uuid,
        field: MutationField,
    ) -> Result<InFlightGuard<'_>, FeedActionError> {
        let mut state = self.inner.state();
        if state.disposed {
            return Err(FeedActionError::Disposed);
        }
        if !state.store.contains(post_id) {
            return Err(FeedActionError::UnknownPost(post_id));
        }
        if !state.in_flight.insert((post_id, field)) {
            return Err(FeedActionError::InFlight { post_id, field });
        }
        Ok(InFlightGuard {
            inner: &self.inner,
            key: (post_id, field),
        })
    }

    fn finish<T>(
        &self,
        verb: &'static str,
        result: Result<T, PostGatewayError>,
        apply: impl FnOnce(&mut SessionState, &T),
    ) -> Result<T, FeedActionError> {
        let mut state = self.inner.state();
        if state.disposed {
            discard_stale(verb);
            return Err(FeedActionError::Disposed);
        }
        match result {
            Ok(value) => {
                apply(&mut *state, &value);
                Ok(value)
            }
            Err(err) => {
                if let Some(notice) = notice_for(&err) {
                    state.notices.push(notice);
                }
                Err(err.into())
            }
        }
    }
}

fn notice_for(err: &PostGatewayError) -> Option<Notice> {
    let kind = match err {
        PostGatewayError::AuthRequired { .. } => NoticeKind::AuthRequired,
        PostGatewayError::Validation(_) => NoticeKind::Validation,
        PostGatewayError::NotFound(_) | PostGatewayError::Persistence(_) => return None,
    };
    Some(Notice {
        kind,
        message: err.to_string(),
    })
}

fn discard_stale(verb: &'static str) {
    debug!(verb, "discarding result for a disposed feed view");
    counter!("teamboard_feed_stale_response_total").increment(1);
}
