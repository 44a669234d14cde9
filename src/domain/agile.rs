//! Agile records: team agile boards, roles, sprint plans and members.

use serde::Serialize;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::entities::UserProfile;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamAgileRecord {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgileRoleRecord {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SprintPlanRecord {
    pub id: Uuid,
    pub team_id: Uuid,
    pub agile_id: Option<Uuid>,
    pub title: String,
    pub goal: Option<String>,
    pub start_on: Option<Date>,
    pub end_on: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A member row, optionally enriched with the referenced user's profile fields.
///
/// The profile fields are absent whenever enrichment did not happen; that is
/// never an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgileMemberRecord {
    pub id: Uuid,
    pub agile_id: Uuid,
    pub user_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl AgileMemberRecord {
    pub fn is_enriched(&self) -> bool {
        self.name.is_some() || self.email.is_some() || self.avatar_url.is_some()
    }

    /// Copy the display fields of `profile` onto this member.
    pub fn with_profile(self, profile: &UserProfile) -> Self {
        Self {
            name: Some(profile.name.clone()),
            email: Some(profile.email.clone()),
            avatar_url: profile.avatar_url.clone(),
            ..self
        }
    }
}
