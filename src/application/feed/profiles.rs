use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::repos::UsersRepo;
use crate::domain::entities::UserProfile;

/// Lazily populated author profiles for one feed view.
///
/// Entries are never evicted. Once [`ProfileCache::close`] runs the cache stays empty.
#[derive(Debug, Default)]
pub struct ProfileCache {
    profiles: DashMap<Uuid, UserProfile>,
    closed: AtomicBool,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: Uuid) -> Option<UserProfile> {
        self.profiles.get(&user_id).map(|entry| entry.value().clone())
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Drop every entry and refuse lookups that complete afterwards.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.profiles.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn insert(&self, user_id: Uuid, profile: UserProfile) -> bool {
        self.profiles.insert(user_id, profile);
        // A close racing this insert may have cleared before it landed.
        if self.is_closed() {
            self.profiles.remove(&user_id);
            return false;
        }
        true
    }

    /// Fetch the profiles of `user_ids` not cached yet, at most `concurrency` at a time.
    ///
    /// Lookup failures are logged and skipped. Returns how many profiles were added.
    pub async fn ensure_loaded(
        &self,
        users: &dyn UsersRepo,
        user_ids: impl IntoIterator<Item = Uuid>,
        concurrency: usize,
    ) -> usize {
        if self.is_closed() {
            return 0;
        }
        let mut missing: Vec<Uuid> = user_ids
            .into_iter()
            .filter(|id| !self.profiles.contains_key(id))
            .collect();
        missing.sort_unstable();
        missing.dedup();

        stream::iter(missing)
            .map(|user_id| async move { (user_id, users.find_by_id(user_id).await) })
            .buffer_unordered(concurrency.max(1))
            .fold(0, |added, (user_id, result)| async move {
                match result {
                    Ok(Some(profile)) => {
                        if self.insert(user_id, profile) {
                            added + 1
                        } else {
                            debug!(user_id = %user_id, "author profile arrived after close");
                            added
                        }
                    }
                    Ok(None) => {
                        debug!(user_id = %user_id, "author profile not found");
                        added
                    }
                    Err(err) => {
                        warn!(user_id = %user_id, error = %err, "failed to fetch author profile");
                        added
                    }
                }
            })
            .await
    }
}
