//! In-memory repositories shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::application::actor::Actor;
use crate::application::confirm::{ConfirmDecision, ConfirmPrompt, ConfirmationService};
use crate::application::repos::{
    AgileRepo, CreateCommentParams, CreatePostParams, PostsRepo, PostsWriteRepo, RepoError,
    ToggleReactionParams, UpdatePostParams, UsersRepo,
};
use crate::domain::agile::{AgileMemberRecord, AgileRoleRecord, SprintPlanRecord, TeamAgileRecord};
use crate::domain::entities::{CommentRecord, PostRecord, UserProfile};
use crate::domain::reactions::Reactions;
use crate::domain::types::PostKind;

pub fn actor(name: &str) -> Actor {
    Actor {
        id: Uuid::new_v4(),
        name: name.to_string(),
        avatar_url: None,
    }
}

pub fn minute(offset: i64) -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH + Duration::minutes(offset)
}

pub fn profile(id: Uuid, name: &str) -> UserProfile {
    UserProfile {
        id,
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        avatar_url: Some(format!("https://avatars.example.com/{id}")),
    }
}

#[derive(Default)]
pub struct InMemoryPosts {
    posts: Mutex<Vec<PostRecord>>,
    clock: AtomicUsize,
    writes: AtomicUsize,
    reads: AtomicUsize,
    write_failure: Mutex<Option<RepoError>>,
    read_failure: Mutex<Option<RepoError>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl InMemoryPosts {
    fn tick(&self) -> OffsetDateTime {
        minute(self.clock.fetch_add(1, Ordering::SeqCst) as i64)
    }

    pub fn seed(&self, team_id: Uuid, title: &str, pinned: bool) -> PostRecord {
        let now = self.tick();
        let post = PostRecord {
            id: Uuid::new_v4(),
            team_id,
            section_id: None,
            kind: PostKind::Post,
            title: title.to_string(),
            description: String::new(),
            is_pinned: pinned,
            reactions: Reactions::new(),
            comments: Vec::new(),
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        };
        self.posts.lock().unwrap().push(post.clone());
        post
    }

    pub fn snapshot(&self) -> Vec<PostRecord> {
        self.posts.lock().unwrap().clone()
    }

    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn fail_writes_with(&self, err: RepoError) {
        *self.write_failure.lock().unwrap() = Some(err);
    }

    pub fn fail_reads_with(&self, err: RepoError) {
        *self.read_failure.lock().unwrap() = Some(err);
    }

    /// Make every subsequent write wait for one `notify_one` on the returned handle.
    pub fn hold_writes(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    async fn begin_write(&self) -> Result<(), RepoError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.write_failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn with_post<T>(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut PostRecord) -> T,
    ) -> Result<T, RepoError> {
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or(RepoError::NotFound)?;
        Ok(apply(post))
    }
}

#[async_trait]
impl PostsRepo for InMemoryPosts {
    async fn list_by_team(&self, team_id: Uuid) -> Result<Vec<PostRecord>, RepoError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.read_failure.lock().unwrap().clone() {
            return Err(err);
        }
        let mut posts: Vec<_> = self
            .snapshot()
            .into_iter()
            .filter(|post| post.team_id == team_id)
            .collect();
        posts.sort_by_key(|post| post.created_at);
        Ok(posts)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot().into_iter().find(|post| post.id == id))
    }
}

#[async_trait]
impl PostsWriteRepo for InMemoryPosts {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        self.begin_write().await?;
        let now = self.tick();
        let post = PostRecord {
            id: Uuid::new_v4(),
            team_id: params.team_id,
            section_id: params.section_id,
            kind: params.kind,
            title: params.title,
            description: params.description,
            is_pinned: false,
            reactions: Reactions::new(),
            comments: Vec::new(),
            created_by: params.created_by,
            created_at: now,
            updated_at: now,
        };
        self.posts.lock().unwrap().push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        self.begin_write().await?;
        let now = self.tick();
        self.with_post(params.id, |post| {
            if let Some(title) = params.title {
                post.title = title;
            }
            if let Some(description) = params.description {
                post.description = description;
            }
            post.updated_at = now;
            post.clone()
        })
    }

    async fn toggle_post_pinned(&self, id: Uuid) -> Result<PostRecord, RepoError> {
        self.begin_write().await?;
        self.with_post(id, |post| {
            post.is_pinned = !post.is_pinned;
            post.clone()
        })
    }

    async fn toggle_post_reaction(
        &self,
        params: ToggleReactionParams,
    ) -> Result<Reactions, RepoError> {
        self.begin_write().await?;
        self.with_post(params.post_id, |post| {
            post.reactions = post.reactions.toggled(&params.emoji, params.user_id);
            post.reactions.clone()
        })
    }

    async fn append_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<Vec<CommentRecord>, RepoError> {
        self.begin_write().await?;
        let now = self.tick();
        self.with_post(params.post_id, |post| {
            post.comments.push(CommentRecord {
                id: Uuid::new_v4(),
                post_id: params.post_id,
                author_id: params.author_id,
                content: params.content,
                created_at: now,
            });
            post.comments.clone()
        })
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, RepoError> {
        self.begin_write().await?;
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|post| post.id != id);
        Ok(posts.len() != before)
    }
}

#[derive(Default)]
pub struct InMemoryUsers {
    profiles: Mutex<Vec<UserProfile>>,
    failure: Mutex<Option<RepoError>>,
    single_calls: AtomicUsize,
    batch_calls: AtomicUsize,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl InMemoryUsers {
    pub fn with_profiles(profiles: Vec<UserProfile>) -> Self {
        Self {
            profiles: Mutex::new(profiles),
            ..Self::default()
        }
    }

    pub fn insert(&self, profile: UserProfile) {
        self.profiles.lock().unwrap().push(profile);
    }

    pub fn fail_with(&self, err: RepoError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    /// Make every subsequent single lookup wait for one `notify_one` on the returned handle.
    pub fn hold_lookups(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(notify.clone());
        notify
    }

    pub fn single_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), RepoError> {
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl UsersRepo for InMemoryUsers {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, RepoError> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check()?;
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .find(|profile| profile.id == id)
            .cloned())
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<UserProfile>, RepoError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .iter()
            .filter(|profile| ids.contains(&profile.id))
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryAgile {
    pub agile: Vec<TeamAgileRecord>,
    pub roles: Vec<AgileRoleRecord>,
    pub plans: Vec<SprintPlanRecord>,
    pub members: Vec<AgileMemberRecord>,
    pub failure: Option<RepoError>,
}

impl InMemoryAgile {
    fn check(&self) -> Result<(), RepoError> {
        match self.failure.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub fn member(agile_id: Uuid, user_id: Option<Uuid>, offset: i64) -> AgileMemberRecord {
    AgileMemberRecord {
        id: Uuid::new_v4(),
        agile_id,
        user_id,
        role_id: None,
        created_at: minute(offset),
        name: None,
        email: None,
        avatar_url: None,
    }
}

#[async_trait]
impl AgileRepo for InMemoryAgile {
    async fn list_team_agile(&self, team_id: Uuid) -> Result<Vec<TeamAgileRecord>, RepoError> {
        self.check()?;
        let mut rows: Vec<_> = self
            .agile
            .iter()
            .filter(|row| row.team_id == team_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_roles(&self, team_id: Uuid) -> Result<Vec<AgileRoleRecord>, RepoError> {
        self.check()?;
        Ok(self
            .roles
            .iter()
            .filter(|row| row.team_id == team_id)
            .cloned()
            .collect())
    }

    async fn list_sprint_plans(&self, team_id: Uuid) -> Result<Vec<SprintPlanRecord>, RepoError> {
        self.check()?;
        Ok(self
            .plans
            .iter()
            .filter(|row| row.team_id == team_id)
            .cloned()
            .collect())
    }

    async fn find_role(&self, id: Uuid) -> Result<Option<AgileRoleRecord>, RepoError> {
        self.check()?;
        Ok(self.roles.iter().find(|row| row.id == id).cloned())
    }

    async fn list_members(&self, agile_id: Uuid) -> Result<Vec<AgileMemberRecord>, RepoError> {
        self.check()?;
        let mut rows: Vec<_> = self
            .members
            .iter()
            .filter(|row| row.agile_id == agile_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.created_at);
        Ok(rows)
    }
}

/// Answers every prompt with a fixed decision and records what was asked.
pub struct ScriptedConfirm {
    decision: ConfirmDecision,
    prompts: Mutex<Vec<ConfirmPrompt>>,
}

impl ScriptedConfirm {
    pub fn new(decision: ConfirmDecision) -> Self {
        Self {
            decision,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<ConfirmPrompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConfirmationService for ScriptedConfirm {
    async fn confirm(&self, prompt: ConfirmPrompt) -> ConfirmDecision {
        self.prompts.lock().unwrap().push(prompt);
        self.decision
    }
}
