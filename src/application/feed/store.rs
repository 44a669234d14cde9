use std::collections::HashSet;

use uuid::Uuid;

use crate::application::repos::PostsRepo;
use crate::domain::entities::{CommentRecord, PostRecord};
use crate::domain::reactions::Reactions;

use super::FeedError;

/// Fetch every post of `team_id`, oldest first.
pub async fn fetch_team_posts(
    posts: &dyn PostsRepo,
    team_id: Option<Uuid>,
) -> Result<Vec<PostRecord>, FeedError> {
    let team_id = team_id.ok_or(FeedError::MissingTeam)?;
    posts.list_by_team(team_id).await.map_err(FeedError::Fetch)
}

/// Local copy of one team's posts, updated in place by id.
///
/// A post id is never present twice.
#[derive(Debug, Clone, Default)]
pub struct FeedStore {
    team_id: Option<Uuid>,
    posts: Vec<PostRecord>,
    pinned: HashSet<Uuid>,
}

impl FeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn team_id(&self) -> Option<Uuid> {
        self.team_id
    }

    pub fn posts(&self) -> &[PostRecord] {
        &self.posts
    }

    pub fn get(&self, id: Uuid) -> Option<&PostRecord> {
        self.posts.iter().find(|post| post.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    pub fn pinned_ids(&self) -> &HashSet<Uuid> {
        &self.pinned
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Fetch and replace. On failure the current contents are kept.
    pub async fn load(
        &mut self,
        posts: &dyn PostsRepo,
        team_id: Option<Uuid>,
    ) -> Result<usize, FeedError> {
        let fetched = fetch_team_posts(posts, team_id).await?;
        if let Some(team_id) = team_id {
            self.replace(team_id, fetched);
        }
        Ok(self.posts.len())
    }

    /// Replace all local state, rebuilding the pinned set from the rows.
    pub fn replace(&mut self, team_id: Uuid, posts: Vec<PostRecord>) {
        let mut seen = HashSet::with_capacity(posts.len());
        self.posts = posts
            .into_iter()
            .filter(|post| seen.insert(post.id))
            .collect();
        self.pinned = self
            .posts
            .iter()
            .filter(|post| post.is_pinned)
            .map(|post| post.id)
            .collect();
        self.team_id = Some(team_id);
    }

    /// Mirror a confirmed pin toggle. Returns whether a post changed.
    pub fn apply_pin_result(&mut self, post_id: Uuid, updated: Option<&PostRecord>) -> bool {
        let Some(updated) = updated else {
            return false;
        };
        let Some(post) = self.post_mut(post_id) else {
            return false;
        };
        post.is_pinned = updated.is_pinned;
        if updated.is_pinned {
            self.pinned.insert(post_id);
        } else {
            self.pinned.remove(&post_id);
        }
        true
    }

    pub fn apply_reaction_result(&mut self, post_id: Uuid, reactions: Reactions) -> bool {
        match self.post_mut(post_id) {
            Some(post) => {
                post.reactions = reactions;
                true
            }
            None => false,
        }
    }

    pub fn apply_comment_result(&mut self, post_id: Uuid, comments: Vec<CommentRecord>) -> bool {
        match self.post_mut(post_id) {
            Some(post) => {
                post.comments = comments;
                true
            }
            None => false,
        }
    }

    /// Mirror an edit of title and description.
    pub fn apply_update(&mut self, updated: &PostRecord) -> bool {
        match self.post_mut(updated.id) {
            Some(post) => {
                post.title = updated.title.clone();
                post.description = updated.description.clone();
                post.updated_at = updated.updated_at;
                true
            }
            None => false,
        }
    }

    /// Add a post at the end of insertion order. Known ids are ignored.
    pub fn append(&mut self, post: PostRecord) -> bool {
        if self.contains(post.id) {
            return false;
        }
        if post.is_pinned {
            self.pinned.insert(post.id);
        }
        self.posts.push(post);
        true
    }

    pub fn remove(&mut self, post_id: Uuid) -> Option<PostRecord> {
        let index = self.posts.iter().position(|post| post.id == post_id)?;
        self.pinned.remove(&post_id);
        Some(self.posts.remove(index))
    }

    fn post_mut(&mut self, id: Uuid) -> Option<&mut PostRecord> {
        self.posts.iter_mut().find(|post| post.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::repos::RepoError;
    use crate::application::testing::{InMemoryPosts, minute};
    use crate::domain::types::PostKind;

    fn post(title: &str, pinned: bool, offset: i64) -> PostRecord {
        PostRecord {
            id: Uuid::new_v4(),
            team_id: Uuid::nil(),
            section_id: None,
            kind: PostKind::Post,
            title: title.to_string(),
            description: String::new(),
            is_pinned: pinned,
            reactions: Reactions::new(),
            comments: Vec::new(),
            created_by: Uuid::new_v4(),
            created_at: minute(offset),
            updated_at: minute(offset),
        }
    }

    fn comment(post_id: Uuid, content: &str) -> CommentRecord {
        CommentRecord {
            id: Uuid::new_v4(),
            post_id,
            author_id: Uuid::new_v4(),
            content: content.to_string(),
            created_at: minute(0),
        }
    }

    #[tokio::test]
    async fn load_builds_pinned_set_from_rows() {
        let repo = InMemoryPosts::default();
        let team = Uuid::new_v4();
        let pinned = repo.seed(team, "Pinned", true);
        repo.seed(team, "Plain", false);
        repo.seed(Uuid::new_v4(), "Other team", true);

        let mut store = FeedStore::new();
        assert_eq!(store.load(&repo, Some(team)).await.unwrap(), 2);
        assert_eq!(store.pinned_ids().len(), 1);
        assert!(store.pinned_ids().contains(&pinned.id));
        assert_eq!(store.team_id(), Some(team));
    }

    #[tokio::test]
    async fn load_without_team_fails_and_keeps_state() {
        let repo = InMemoryPosts::default();
        let mut store = FeedStore::new();
        store.append(post("Existing", false, 0));

        let err = store.load(&repo, None).await.unwrap_err();
        assert!(matches!(err, FeedError::MissingTeam));
        assert_eq!(store.len(), 1);
        assert_eq!(repo.read_calls(), 0);
    }

    #[tokio::test]
    async fn load_failure_keeps_state() {
        let repo = InMemoryPosts::default();
        repo.fail_reads_with(RepoError::Timeout);
        let mut store = FeedStore::new();
        store.append(post("Existing", false, 0));

        let err = store.load(&repo, Some(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, FeedError::Fetch(RepoError::Timeout)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn append_adds_to_the_end_and_never_duplicates() {
        let mut store = FeedStore::new();
        let first = post("First", false, 0);
        let second = post("Second", true, 1);

        assert!(store.append(first.clone()));
        assert!(store.append(second.clone()));
        assert!(!store.append(first.clone()));

        let ids: Vec<_> = store.posts().iter().map(|post| post.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
        assert!(store.pinned_ids().contains(&second.id));
    }

    #[test]
    fn replace_drops_duplicate_ids() {
        let mut store = FeedStore::new();
        let original = post("Dup", false, 0);
        store.replace(Uuid::nil(), vec![original.clone(), original.clone()]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn pin_result_updates_flag_and_set() {
        let mut store = FeedStore::new();
        let target = post("Target", false, 0);
        store.append(target.clone());

        let mut updated = target.clone();
        updated.is_pinned = true;
        updated.title = "ignored".to_string();
        assert!(store.apply_pin_result(target.id, Some(&updated)));
        assert!(store.get(target.id).unwrap().is_pinned);
        assert_eq!(store.get(target.id).unwrap().title, "Target");
        assert!(store.pinned_ids().contains(&target.id));

        updated.is_pinned = false;
        store.apply_pin_result(target.id, Some(&updated));
        assert!(!store.pinned_ids().contains(&target.id));
    }

    #[test]
    fn absent_pin_result_is_a_no_op() {
        let mut store = FeedStore::new();
        let target = post("Target", false, 0);
        store.append(target.clone());
        assert!(!store.apply_pin_result(target.id, None));
        assert!(!store.get(target.id).unwrap().is_pinned);
    }

    #[test]
    fn reaction_result_replaces_only_reactions() {
        let mut store = FeedStore::new();
        let target = post("Target", true, 0);
        store.append(target.clone());

        let reactions = Reactions::new().toggled("like", Uuid::new_v4());
        assert!(store.apply_reaction_result(target.id, reactions.clone()));

        let stored = store.get(target.id).unwrap();
        assert_eq!(stored.reactions, reactions);
        assert_eq!(stored.title, target.title);
        assert!(stored.is_pinned);
    }

    #[test]
    fn comment_result_round_trips() {
        let mut store = FeedStore::new();
        let target = post("Target", false, 0);
        store.append(target.clone());

        let earlier = vec![comment(target.id, "one")];
        store.apply_comment_result(target.id, earlier.clone());

        let mut superset = earlier.clone();
        superset.push(comment(target.id, "two"));
        store.apply_comment_result(target.id, superset.clone());

        let stored = &store.get(target.id).unwrap().comments;
        assert_eq!(stored, &superset);
        assert_eq!(stored[0], earlier[0]);
    }

    #[test]
    fn remove_drops_post_and_pin() {
        let mut store = FeedStore::new();
        let target = post("Target", true, 0);
        store.append(target.clone());

        assert_eq!(store.remove(target.id).map(|post| post.id), Some(target.id));
        assert!(store.is_empty());
        assert!(store.pinned_ids().is_empty());
        assert!(store.remove(target.id).is_none());
    }

    #[test]
    fn update_result_replaces_content_fields() {
        let mut store = FeedStore::new();
        let target = post("Before", false, 0);
        store.append(target.clone());

        let mut updated = target.clone();
        updated.title = "After".to_string();
        updated.description = "<p>new</p>".to_string();
        updated.is_pinned = true;
        assert!(store.apply_update(&updated));

        let stored = store.get(target.id).unwrap();
        assert_eq!(stored.title, "After");
        assert_eq!(stored.description, "<p>new</p>");
        assert!(!stored.is_pinned);
    }
}
