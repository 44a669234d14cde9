//! Read-only agile queries: team boards, roles, sprint plans and enriched members.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

use crate::application::join::{JoinOutcome, KeyJoin};
use crate::application::repos::{AgileRepo, RepoError, UsersRepo};
use crate::domain::agile::{AgileMemberRecord, AgileRoleRecord, SprintPlanRecord, TeamAgileRecord};
use crate::domain::entities::UserProfile;

/// Raw query string of the agile endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgileQueryParams {
    pub team_id: Option<String>,
    pub agile_id: Option<String>,
    pub role_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// One supported agile query, decoded once from [`AgileQueryParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgileQuery {
    TeamAgile { team_id: Uuid },
    Roles { team_id: Uuid },
    Plans { team_id: Uuid },
    Role { role_id: Uuid },
    Members { agile_id: Uuid },
}

#[derive(Debug, Clone, Error)]
pub enum AgileQueryError {
    #[error("Invalid request parameters")]
    InvalidParameters,
    #[error("invalid `{param}`: `{value}` is not a valid id")]
    InvalidId { param: &'static str, value: String },
    #[error(transparent)]
    Repo(#[from] RepoError),
    /// The member rows themselves could not be read.
    #[error("failed to load members of agile `{agile_id}`: {source}")]
    Members {
        agile_id: Uuid,
        #[source]
        source: RepoError,
    },
}

impl AgileQueryError {
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AgileQueryError::InvalidParameters | AgileQueryError::InvalidId { .. }
        )
    }
}

impl AgileQuery {
    /// Pick the query by which parameters are present.
    ///
    /// Precedence: team with `type=agile`, `type=roles`, `type=plans`, then
    /// `roleId`, then `agileId`. Blank values count as absent.
    pub fn decode(params: &AgileQueryParams) -> Result<Self, AgileQueryError> {
        let team = present(&params.team_id);
        let kind = present(&params.kind);

        if let (Some(team), Some(kind @ ("agile" | "roles" | "plans"))) = (team, kind) {
            let team_id = parse_id("teamId", team)?;
            return Ok(match kind {
                "agile" => AgileQuery::TeamAgile { team_id },
                "roles" => AgileQuery::Roles { team_id },
                _ => AgileQuery::Plans { team_id },
            });
        }

        if let Some(role) = present(&params.role_id) {
            return parse_id("roleId", role).map(|role_id| AgileQuery::Role { role_id });
        }

        if let Some(agile) = present(&params.agile_id) {
            return parse_id("agileId", agile).map(|agile_id| AgileQuery::Members { agile_id });
        }

        Err(AgileQueryError::InvalidParameters)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgileQuery::TeamAgile { .. } => "team_agile",
            AgileQuery::Roles { .. } => "roles",
            AgileQuery::Plans { .. } => "plans",
            AgileQuery::Role { .. } => "role",
            AgileQuery::Members { .. } => "members",
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn parse_id(param: &'static str, value: &str) -> Result<Uuid, AgileQueryError> {
    Uuid::parse_str(value).map_err(|_| AgileQueryError::InvalidId {
        param,
        value: value.to_string(),
    })
}

/// Serialized as the bare array, object or `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AgileResponse {
    TeamAgile(Vec<TeamAgileRecord>),
    Roles(Vec<AgileRoleRecord>),
    Plans(Vec<SprintPlanRecord>),
    Role(Option<AgileRoleRecord>),
    Members(Vec<AgileMemberRecord>),
}

const MEMBER_PROFILES: KeyJoin<AgileMemberRecord, UserProfile, Uuid> = KeyJoin::new(
    "agile_member.user_id",
    |member| member.user_id,
    |profile| profile.id,
    AgileMemberRecord::with_profile,
);

#[derive(Clone)]
pub struct AgileQueryService {
    agile: Arc<dyn AgileRepo>,
    users: Arc<dyn UsersRepo>,
}

impl AgileQueryService {
    pub fn new(agile: Arc<dyn AgileRepo>, users: Arc<dyn UsersRepo>) -> Self {
        Self { agile, users }
    }

    pub async fn execute(&self, query: AgileQuery) -> Result<AgileResponse, AgileQueryError> {
        debug!(query = query.label(), "running agile query");
        let response = match query {
            AgileQuery::TeamAgile { team_id } => {
                AgileResponse::TeamAgile(self.agile.list_team_agile(team_id).await?)
            }
            AgileQuery::Roles { team_id } => {
                AgileResponse::Roles(self.agile.list_roles(team_id).await?)
            }
            AgileQuery::Plans { team_id } => {
                AgileResponse::Plans(self.agile.list_sprint_plans(team_id).await?)
            }
            AgileQuery::Role { role_id } => {
                AgileResponse::Role(self.agile.find_role(role_id).await?)
            }
            AgileQuery::Members { agile_id } => {
                AgileResponse::Members(self.enriched_members(agile_id).await?)
            }
        };
        Ok(response)
    }

    /// Members of `agile_id` in join order, with profile fields where available.
    ///
    /// Only a failure to read the member rows is an error; a failed or empty
    /// profile lookup returns the rows as stored.
    pub async fn enriched_members(
        &self,
        agile_id: Uuid,
    ) -> Result<Vec<AgileMemberRecord>, AgileQueryError> {
        let members = self.agile.list_members(agile_id).await.map_err(|source| {
            error!(agile_id = %agile_id, error = %source, "failed to load agile members");
            AgileQueryError::Members { agile_id, source }
        })?;

        let users = self.users.clone();
        let joined = MEMBER_PROFILES
            .run(members, |ids| async move { users.list_by_ids(&ids).await })
            .await;

        if let JoinOutcome::Merged { matched } = joined.outcome {
            debug!(agile_id = %agile_id, members = joined.rows.len(), matched, "members enriched");
        }
        Ok(joined.rows)
    }
}
