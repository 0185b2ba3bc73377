//! Port abstraction for team persistence adapters and their errors.

use async_trait::async_trait;

use crate::domain::team::{Team, TeamDraft, TeamId, TeamRoster};

/// Persistence errors raised by [`TeamRepository`] adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TeamPersistenceError {
    /// Repository connection could not be established.
    #[error("team repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("team repository query failed: {message}")]
    Query { message: String },
}

impl TeamPersistenceError {
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
}

/// Persistence port for team records.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Fetch a team by identifier.
    async fn find_by_id(&self, id: TeamId) -> Result<Option<Team>, TeamPersistenceError>;

    /// Every stored team with its members eagerly loaded, ordered by
    /// identifier. Does not include the synthetic free-agents roster.
    async fn list_with_members(&self) -> Result<Vec<TeamRoster>, TeamPersistenceError>;

    /// Insert a new team with a zeroed used budget and return the stored
    /// record.
    async fn create(&self, draft: &TeamDraft) -> Result<Team, TeamPersistenceError>;
}
