use std::cmp::Ordering;

use crate::domain::entities::PostRecord;
use crate::domain::types::{SectionFilter, SortOption};

/// Display parameters for one render of the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedQuery {
    pub section: SectionFilter,
    pub search: String,
    pub sort: SortOption,
}

impl FeedQuery {
    pub fn apply<'a>(&self, posts: &'a [PostRecord]) -> Vec<&'a PostRecord> {
        order(posts, self.section, &self.search, self.sort)
    }
}

/// Filter and sort posts for display.
///
/// A post is kept when it is in the selected section and, for a non-blank
/// search, its title or description contains the search text
/// case-insensitively. Pinned posts come first; `sort` orders within each pin
/// group and ties keep their input order.
pub fn order<'a>(
    posts: &'a [PostRecord],
    section: SectionFilter,
    search: &str,
    sort: SortOption,
) -> Vec<&'a PostRecord> {
    let needle = search.trim().to_lowercase();

    let mut visible: Vec<&PostRecord> = posts
        .iter()
        .filter(|post| section.matches(post.section_id))
        .filter(|post| needle.is_empty() || matches_search(post, &needle))
        .collect();

    visible.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| compare_secondary(a, b, sort))
    });
    visible
}

fn matches_search(post: &PostRecord, needle: &str) -> bool {
    post.title.to_lowercase().contains(needle) || post.description.to_lowercase().contains(needle)
}

fn compare_secondary(a: &PostRecord, b: &PostRecord, sort: SortOption) -> Ordering {
    match sort {
        SortOption::Newest => a.created_at.cmp(&b.created_at),
        SortOption::Oldest => b.created_at.cmp(&a.created_at),
        SortOption::Alphabetical => compare_titles(&a.title, &b.title),
        SortOption::Popular => b.reactions.total().cmp(&a.reactions.total()),
    }
}

/// Case-insensitive title order; titles equal under folding fall back to byte order.
fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}
