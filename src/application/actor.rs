//! The signed-in user on whose behalf a mutation runs.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use uuid::Uuid;

use crate::domain::entities::UserProfile;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl From<&UserProfile> for Actor {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name.clone(),
            avatar_url: profile.avatar_url.clone(),
        }
    }
}

/// Accessor for the currently authenticated user, if any.
pub trait ActorSource: Send + Sync {
    fn current_actor(&self) -> Option<Actor>;
}

/// Session-held actor slot updated on sign-in and sign-out.
#[derive(Debug, Clone, Default)]
pub struct SessionActor {
    inner: Arc<RwLock<Option<Actor>>>,
}

impl SessionActor {
    pub fn signed_in(actor: Actor) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(actor))),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn set(&self, actor: Option<Actor>) {
        match self.inner.write() {
            Ok(mut slot) => *slot = actor,
            Err(poisoned) => *poisoned.into_inner() = actor,
        }
    }
}

impl ActorSource for SessionActor {
    fn current_actor(&self) -> Option<Actor> {
        match self.inner.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
