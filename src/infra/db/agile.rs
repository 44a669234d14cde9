use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::application::repos::{AgileRepo, RepoError};
use crate::domain::agile::{AgileMemberRecord, AgileRoleRecord, SprintPlanRecord, TeamAgileRecord};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct NamedRow {
    id: Uuid,
    team_id: Uuid,
    name: String,
    description: Option<String>,
    created_at: OffsetDateTime,
}

impl From<NamedRow> for TeamAgileRecord {
    fn from(row: NamedRow) -> Self {
        Self {
            id: row.id,
            team_id: row.team_id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

impl From<NamedRow> for AgileRoleRecord {
    fn from(row: NamedRow) -> Self {
        Self {
            id: row.id,
            team_id: row.team_id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SprintPlanRow {
    id: Uuid,
    team_id: Uuid,
    agile_id: Option<Uuid>,
    title: String,
    goal: Option<String>,
    start_on: Option<Date>,
    end_on: Option<Date>,
    created_at: OffsetDateTime,
}

impl From<SprintPlanRow> for SprintPlanRecord {
    fn from(row: SprintPlanRow) -> Self {
        Self {
            id: row.id,
            team_id: row.team_id,
            agile_id: row.agile_id,
            title: row.title,
            goal: row.goal,
            start_on: row.start_on,
            end_on: row.end_on,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    id: Uuid,
    agile_id: Uuid,
    user_id: Option<Uuid>,
    role_id: Option<Uuid>,
    created_at: OffsetDateTime,
}

impl From<MemberRow> for AgileMemberRecord {
    fn from(row: MemberRow) -> Self {
        Self {
            id: row.id,
            agile_id: row.agile_id,
            user_id: row.user_id,
            role_id: row.role_id,
            created_at: row.created_at,
            name: None,
            email: None,
            avatar_url: None,
        }
    }
}

#[async_trait]
impl AgileRepo for PostgresRepositories {
    async fn list_team_agile(&self, team_id: Uuid) -> Result<Vec<TeamAgileRecord>, RepoError> {
        let rows = sqlx::query_as::<_, NamedRow>(
            r#"
            SELECT id, team_id, name, description, created_at
            FROM team_agile
            WHERE team_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(team_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TeamAgileRecord::from).collect())
    }

    async fn list_roles(&self, team_id: Uuid) -> Result<Vec<AgileRoleRecord>, RepoError> {
        let rows = sqlx::query_as::<_, NamedRow>(
            r#"
            SELECT id, team_id, name, description, created_at
            FROM agile_role
            WHERE team_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(AgileRoleRecord::from).collect())
    }

    async fn list_sprint_plans(&self, team_id: Uuid) -> Result<Vec<SprintPlanRecord>, RepoError> {
        let rows = sqlx::query_as::<_, SprintPlanRow>(
            r#"
            SELECT id, team_id, agile_id, title, goal, start_on, end_on, created_at
            FROM sprint_plan
            WHERE team_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(SprintPlanRecord::from).collect())
    }

    async fn find_role(&self, id: Uuid) -> Result<Option<AgileRoleRecord>, RepoError> {
        let row = sqlx::query_as::<_, NamedRow>(
            "SELECT id, team_id, name, description, created_at FROM agile_role WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AgileRoleRecord::from))
    }

    async fn list_members(&self, agile_id: Uuid) -> Result<Vec<AgileMemberRecord>, RepoError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, agile_id, user_id, role_id, created_at
            FROM agile_member
            WHERE agile_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(agile_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(AgileMemberRecord::from).collect())
    }
}
