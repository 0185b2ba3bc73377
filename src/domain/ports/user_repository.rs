//! Port abstraction for user persistence adapters and their errors.

use async_trait::async_trait;

use crate::domain::user::{User, UserDraft, UserId, UserPatch};

/// Persistence errors raised by [`UserRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserPersistenceError {
    /// Repository connection could not be established.
    #[error("user repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query { message: String },
}

impl UserPersistenceError {
    /// Helper for connection oriented failures.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Helper for query failures.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Persistence port for user records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Every stored user, ordered by identifier.
    async fn list(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Every user without a team assignment, ordered by identifier.
    async fn list_free_agents(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Insert a new user as a free agent and return the stored record.
    async fn create(&self, draft: &UserDraft) -> Result<User, UserPersistenceError>;

    /// Overwrite the profile fields of an existing user. The stored
    /// `team_id` is left untouched.
    async fn replace(&self, user: &User) -> Result<User, UserPersistenceError>;

    /// Apply a partial update and return the stored record, or `None` when
    /// no row qualified. When the patch carries a salary, the update only
    /// applies while the row is still unassigned, so a concurrent join
    /// cannot slip a salary change past the budget invariant.
    async fn update_fields(
        &self,
        id: UserId,
        patch: &UserPatch,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Delete a user row. Returns whether a row existed. Only valid for
    /// free agents; assigned users go through the membership store.
    async fn delete(&self, id: UserId) -> Result<bool, UserPersistenceError>;
}
