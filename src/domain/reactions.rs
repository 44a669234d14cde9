//! Emoji reactions keyed by emoji identifier, each holding the set of reacting users.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::error::DomainError;

pub const DEFAULT_REACTION: &str = "like";
pub const MAX_REACTION_KEY_CHARS: usize = 32;

/// Keys never map to an empty user set, including when read back from storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Reactions(BTreeMap<String, BTreeSet<Uuid>>);

impl Reactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self, emoji: &str) -> Option<&BTreeSet<Uuid>> {
        self.0.get(emoji)
    }

    pub fn has_reacted(&self, emoji: &str, user_id: Uuid) -> bool {
        self.0
            .get(emoji)
            .is_some_and(|users| users.contains(&user_id))
    }

    /// Sum of users across every emoji key.
    pub fn total(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return a copy with `user_id`'s membership under `emoji` flipped.
    ///
    /// Keys whose user set becomes empty are dropped.
    pub fn toggled(&self, emoji: &str, user_id: Uuid) -> Self {
        let mut next = self.0.clone();
        let users = next.entry(emoji.to_string()).or_default();
        if !users.remove(&user_id) {
            users.insert(user_id);
        }
        if users.is_empty() {
            next.remove(emoji);
        }
        Self(next)
    }
}

impl FromIterator<(String, BTreeSet<Uuid>)> for Reactions {
    fn from_iter<T: IntoIterator<Item = (String, BTreeSet<Uuid>)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .filter(|(_, users)| !users.is_empty())
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for Reactions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<String, BTreeSet<Uuid>>::deserialize(deserializer)
            .map(|map| map.into_iter().collect())
    }
}

/// Trim and check an emoji key.
pub fn normalize_reaction_key(raw: &str) -> Result<String, DomainError> {
    let key = raw.trim();
    if key.is_empty() {
        return Err(DomainError::validation("emoji", "reaction key must not be blank"));
    }
    if key.chars().count() > MAX_REACTION_KEY_CHARS {
        return Err(DomainError::validation(
            "emoji",
            format!("reaction key exceeds {MAX_REACTION_KEY_CHARS} characters"),
        ));
    }
    Ok(key.to_string())
}
