//! PostgreSQL-backed `TeamRepository` implementation using Diesel.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{TeamPersistenceError, TeamRepository};
use crate::domain::{Team, TeamDraft, TeamId, TeamRoster, User};

use super::models::{NewTeamRow, TeamRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{teams, users};

/// Diesel-backed implementation of the `TeamRepository` port.
#[derive(Clone)]
pub struct DieselTeamRepository {
    pool: DbPool,
}

impl DieselTeamRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TeamPersistenceError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            TeamPersistenceError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> TeamPersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    debug!(error = %error, "team repository operation failed");
    match error {
        DieselError::NotFound => TeamPersistenceError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            TeamPersistenceError::connection("database connection error")
        }
        _ => TeamPersistenceError::query("database error"),
    }
}

fn row_to_team(row: TeamRow) -> Result<Team, TeamPersistenceError> {
    let id = row.id;
    Team::try_from(row).map_err(|err| {
        TeamPersistenceError::query(format!("stored team {id} violates domain invariants: {err}"))
    })
}

fn row_to_member(row: UserRow) -> Result<User, TeamPersistenceError> {
    let id = row.id;
    User::try_from(row).map_err(|err| {
        TeamPersistenceError::query(format!("stored user {id} violates domain invariants: {err}"))
    })
}

#[async_trait]
impl TeamRepository for DieselTeamRepository {
    async fn find_by_id(&self, id: TeamId) -> Result<Option<Team>, TeamPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<TeamRow> = teams::table
            .filter(teams::id.eq(id.value()))
            .select(TeamRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_team).transpose()
    }

    async fn list_with_members(&self) -> Result<Vec<TeamRoster>, TeamPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let team_rows: Vec<TeamRow> = teams::table
            .order(teams::id.asc())
            .select(TeamRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let member_rows: Vec<UserRow> = users::table
            .filter(users::team_id.is_not_null())
            .order(users::id.asc())
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut members_by_team: HashMap<i64, Vec<User>> = HashMap::new();
        for row in member_rows {
            let Some(team_id) = row.team_id else { continue };
            members_by_team
                .entry(team_id)
                .or_default()
                .push(row_to_member(row)?);
        }

        team_rows
            .into_iter()
            .map(|row| {
                let members = members_by_team.remove(&row.id).unwrap_or_default();
                Ok(TeamRoster::new(row_to_team(row)?, members))
            })
            .collect()
    }

    async fn create(&self, draft: &TeamDraft) -> Result<Team, TeamPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let new_row = NewTeamRow {
            name: draft.name(),
            budget: draft.budget(),
            used_budget: 0,
            revision: 0,
        };
        let row: TeamRow = diesel::insert_into(teams::table)
            .values(&new_row)
            .returning(TeamRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        row_to_team(row)
    }
}
