//! Shared domain enumerations aligned with persisted database enums.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "post_kind", rename_all = "snake_case")]
pub enum PostKind {
    #[default]
    Post,
    Announcement,
}

/// Secondary ordering applied within each pin group of the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    /// Ascending creation time; the newest post lands at the bottom.
    #[default]
    Newest,
    /// Descending creation time.
    Oldest,
    Alphabetical,
    /// Descending total reaction count.
    Popular,
}

impl SortOption {
    /// Parse a sort parameter. Unrecognized values fall back to [`SortOption::Newest`].
    pub fn from_param(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "oldest" => SortOption::Oldest,
            "alphabetical" => SortOption::Alphabetical,
            "popular" => SortOption::Popular,
            _ => SortOption::Newest,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOption::Newest => "newest",
            SortOption::Oldest => "oldest",
            SortOption::Alphabetical => "alphabetical",
            SortOption::Popular => "popular",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Section selector for the feed. `All` is the `"all"` sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SectionFilter {
    #[default]
    All,
    Section(Uuid),
}

impl SectionFilter {
    pub const ALL_SENTINEL: &'static str = "all";

    /// Parse a section parameter; blank input and the sentinel select every section.
    pub fn from_param(value: &str) -> Result<Self, uuid::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(Self::ALL_SENTINEL) {
            return Ok(SectionFilter::All);
        }
        Uuid::parse_str(trimmed).map(SectionFilter::Section)
    }

    pub fn matches(self, section_id: Option<Uuid>) -> bool {
        match self {
            SectionFilter::All => true,
            SectionFilter::Section(id) => section_id == Some(id),
        }
    }
}
