//! Transactional adapter for multi-row membership writes.
//!
//! Joins, leaves, team deletion, and assigned-user deletion each touch a
//! user row and a team row. Both writes commit in one transaction, and the
//! team write carries a revision predicate; zero affected rows means a
//! concurrent writer got there first and the whole transaction rolls back
//! with [`MembershipWriteError::RevisionMismatch`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{MembershipStore, MembershipWriteError};
use crate::domain::{Team, TeamId, User};

use super::models::revision_to_db;
use super::pool::{DbPool, PoolError};
use super::schema::{teams, users};

/// Diesel-backed implementation of the `MembershipStore` port.
#[derive(Clone)]
pub struct DieselMembershipStore {
    pool: DbPool,
}

impl DieselMembershipStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Failure inside a membership transaction, before port-error mapping.
enum TxError {
    Diesel(diesel::result::Error),
    RevisionMismatch,
    MissingUser,
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_pool_error(error: PoolError) -> MembershipWriteError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            MembershipWriteError::connection(message)
        }
    }
}

fn map_tx_error(error: TxError, expected_revision: u32) -> MembershipWriteError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match error {
        TxError::RevisionMismatch => MembershipWriteError::revision_mismatch(expected_revision),
        TxError::MissingUser => MembershipWriteError::query("user row disappeared mid-transaction"),
        TxError::Diesel(error) => {
            debug!(error = %error, "membership transaction failed");
            match error {
                DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
                    MembershipWriteError::connection("database connection error")
                }
                _ => MembershipWriteError::query("database error"),
            }
        }
    }
}

#[async_trait]
impl MembershipStore for DieselMembershipStore {
    async fn commit_assignment(
        &self,
        user: &User,
        team: &Team,
        expected_revision: u32,
    ) -> Result<(), MembershipWriteError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let user_id = user.id().value();
        let assignment = user.team_id().map(|id| id.value());
        let team_id = team.id().value();
        let used_budget = team.used_budget();
        let next_revision = revision_to_db(team.revision());
        let expected = revision_to_db(expected_revision);

        conn.transaction::<(), TxError, _>(|conn| {
            async move {
                let touched = diesel::update(users::table.filter(users::id.eq(user_id)))
                    .set(users::team_id.eq(assignment))
                    .execute(conn)
                    .await?;
                if touched == 0 {
                    return Err(TxError::MissingUser);
                }

                let guarded = diesel::update(
                    teams::table
                        .filter(teams::id.eq(team_id))
                        .filter(teams::revision.eq(expected)),
                )
                .set((
                    teams::used_budget.eq(used_budget),
                    teams::revision.eq(next_revision),
                ))
                .execute(conn)
                .await?;
                if guarded == 0 {
                    return Err(TxError::RevisionMismatch);
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_tx_error(err, expected_revision))
    }

    async fn delete_team_freeing_members(
        &self,
        team_id: TeamId,
        expected_revision: u32,
    ) -> Result<u64, MembershipWriteError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let team_value = team_id.value();
        let expected = revision_to_db(expected_revision);

        conn.transaction::<u64, TxError, _>(|conn| {
            async move {
                let freed = diesel::update(users::table.filter(users::team_id.eq(team_value)))
                    .set(users::team_id.eq(None::<i64>))
                    .execute(conn)
                    .await?;

                let deleted = diesel::delete(
                    teams::table
                        .filter(teams::id.eq(team_value))
                        .filter(teams::revision.eq(expected)),
                )
                .execute(conn)
                .await?;
                if deleted == 0 {
                    return Err(TxError::RevisionMismatch);
                }
                Ok(freed as u64)
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_tx_error(err, expected_revision))
    }

    async fn delete_member(
        &self,
        user: &User,
        team: &Team,
        expected_revision: u32,
    ) -> Result<(), MembershipWriteError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let user_id = user.id().value();
        let team_id = team.id().value();
        let used_budget = team.used_budget();
        let next_revision = revision_to_db(team.revision());
        let expected = revision_to_db(expected_revision);

        conn.transaction::<(), TxError, _>(|conn| {
            async move {
                let deleted = diesel::delete(users::table.filter(users::id.eq(user_id)))
                    .execute(conn)
                    .await?;
                if deleted == 0 {
                    return Err(TxError::MissingUser);
                }

                let guarded = diesel::update(
                    teams::table
                        .filter(teams::id.eq(team_id))
                        .filter(teams::revision.eq(expected)),
                )
                .set((
                    teams::used_budget.eq(used_budget),
                    teams::revision.eq(next_revision),
                ))
                .execute(conn)
                .await?;
                if guarded == 0 {
                    return Err(TxError::RevisionMismatch);
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| map_tx_error(err, expected_revision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn revision_mismatches_carry_the_expected_value() {
        let err = map_tx_error(TxError::RevisionMismatch, 7);
        assert_eq!(err, MembershipWriteError::revision_mismatch(7));
    }

    #[rstest]
    fn missing_user_rows_map_to_query_failures() {
        let err = map_tx_error(TxError::MissingUser, 0);
        assert!(matches!(err, MembershipWriteError::Query { .. }));
    }

    #[rstest]
    fn closed_connections_map_to_connection_failures() {
        let diesel_err = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::ClosedConnection,
            Box::new(String::from("closed")),
        );
        let err = map_tx_error(TxError::Diesel(diesel_err), 0);
        assert!(matches!(err, MembershipWriteError::Connection { .. }));
    }

    #[rstest]
    fn pool_failures_map_to_connection_failures() {
        let err = map_pool_error(PoolError::checkout("timed out"));
        assert!(matches!(err, MembershipWriteError::Connection { .. }));
    }
}
