use std::collections::HashSet;

use uuid::Uuid;

use crate::domain::types::{SectionFilter, SortOption};

use super::ordering::FeedQuery;

/// Per-view display state. Lives as long as the view that owns it.
#[derive(Debug, Clone, Default)]
pub struct FeedViewState {
    query: FeedQuery,
    expanded: HashSet<Uuid>,
}

impl FeedViewState {
    pub fn query(&self) -> &FeedQuery {
        &self.query
    }

    pub fn set_section(&mut self, section: SectionFilter) {
        self.query.section = section;
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.query.sort = sort;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
    }

    /// Flip the expanded state of a post; returns the new state.
    pub fn toggle_expanded(&mut self, post_id: Uuid) -> bool {
        if self.expanded.remove(&post_id) {
            false
        } else {
            self.expanded.insert(post_id);
            true
        }
    }

    pub fn is_expanded(&self, post_id: Uuid) -> bool {
        self.expanded.contains(&post_id)
    }

    pub(crate) fn forget(&mut self, post_id: Uuid) {
        self.expanded.remove(&post_id);
    }
}
