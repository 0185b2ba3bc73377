//! Port for the multi-row writes behind membership changes.
//!
//! Every operation commits in a single transaction and guards the team row
//! with an optimistic revision check, so the budget counter can never drift
//! from the membership it is supposed to mirror.

use async_trait::async_trait;

use crate::domain::team::{Team, TeamId};
use crate::domain::user::User;

/// Errors raised by [`MembershipStore`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MembershipWriteError {
    /// Store connection could not be established.
    #[error("membership store connection failed: {message}")]
    Connection { message: String },
    /// A statement inside the transaction failed.
    #[error("membership store write failed: {message}")]
    Query { message: String },
    /// The team row moved past the expected revision; the caller should
    /// re-read and retry.
    #[error("team revision moved past {expected}")]
    RevisionMismatch { expected: u32 },
}

impl MembershipWriteError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    pub fn revision_mismatch(expected: u32) -> Self {
        Self::RevisionMismatch { expected }
    }
}

/// Transactional writes spanning the user/team pair.
///
/// The engine hands over already-validated next states; adapters persist
/// them atomically or not at all.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Persist a join or leave outcome: the user's new assignment and the
    /// team's new budget figures, in one transaction. The team write only
    /// applies while the stored revision still equals `expected_revision`.
    async fn commit_assignment(
        &self,
        user: &User,
        team: &Team,
        expected_revision: u32,
    ) -> Result<(), MembershipWriteError>;

    /// Clear the assignment of every member and delete the team row, in one
    /// transaction. Returns the number of users freed. The delete only
    /// applies while the stored revision still equals `expected_revision`.
    async fn delete_team_freeing_members(
        &self,
        team_id: TeamId,
        expected_revision: u32,
    ) -> Result<u64, MembershipWriteError>;

    /// Delete an assigned user and release their salary from `team`'s used
    /// budget, in one transaction guarded by `expected_revision`.
    async fn delete_member(
        &self,
        user: &User,
        team: &Team,
        expected_revision: u32,
    ) -> Result<(), MembershipWriteError>;
}
