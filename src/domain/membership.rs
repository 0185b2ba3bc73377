//! The membership engine.
//!
//! Owns every mutation of the user↔team pair. Nothing else writes
//! `team_id` or `used_budget`: joins, leaves, team deletion, and the
//! guarded user-edit paths all run through this service, which validates
//! the budget invariant before any write and commits multi-row changes
//! through the transactional [`MembershipStore`].
//!
//! Team-mutating writes are serialised per team with an optimistic
//! revision check; on a mismatch the whole operation re-reads and retries
//! a bounded number of times before reporting a conflict.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::domain::error::Error;
use crate::domain::ports::{
    MembershipStore, MembershipWriteError, TeamPersistenceError, TeamRepository,
    UserPersistenceError, UserRepository,
};
use crate::domain::team::{Team, TeamDraft, TeamId, TeamRoster};
use crate::domain::user::{User, UserDraft, UserId, UserPatch};

/// Attempts per operation before surfacing a conflict.
const MAX_REVISION_RETRIES: u32 = 3;

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub user: User,
    pub team: Team,
    /// `budget - used_budget` after the join, for display.
    pub remaining_budget: i64,
}

/// Result of a successful leave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub user: User,
    pub team: Team,
}

/// Result of a successful team deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamDeletion {
    pub team: Team,
    pub users_freed: u64,
}

/// Membership engine over the persistence ports.
#[derive(Clone)]
pub struct MembershipService {
    users: Arc<dyn UserRepository>,
    teams: Arc<dyn TeamRepository>,
    store: Arc<dyn MembershipStore>,
}

fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => Error::service_unavailable(message),
        UserPersistenceError::Query { message } => Error::internal(message),
    }
}

fn map_team_error(error: TeamPersistenceError) -> Error {
    match error {
        TeamPersistenceError::Connection { message } => Error::service_unavailable(message),
        TeamPersistenceError::Query { message } => Error::internal(message),
    }
}

fn map_write_error(error: MembershipWriteError) -> Error {
    match error {
        MembershipWriteError::Connection { message } => Error::service_unavailable(message),
        MembershipWriteError::Query { message } => Error::internal(message),
        MembershipWriteError::RevisionMismatch { .. } => {
            Error::conflict("team changed concurrently; retry the request")
        }
    }
}

fn user_not_found(id: UserId) -> Error {
    Error::not_found(format!("no user with id {id}"))
}

fn team_not_found(id: TeamId) -> Error {
    Error::not_found(format!("no team with id {id}"))
}

fn already_member_error(current: TeamId) -> Error {
    Error::invalid_request("user already belongs to a team").with_details(json!({
        "code": "already_member",
        "team_id": current.value(),
    }))
}

fn not_a_member_error(team_id: TeamId) -> Error {
    Error::invalid_request("user is not a member of this team").with_details(json!({
        "code": "not_a_member",
        "team_id": team_id.value(),
    }))
}

fn budget_exceeded_error(team: &Team, user: &User, would_need: i64) -> Error {
    Error::invalid_request("team cannot afford user").with_details(json!({
        "code": "budget_exceeded",
        "budget": team.budget(),
        "current_used": team.used_budget(),
        "user_salary": user.salary(),
        "would_need": would_need,
    }))
}

fn salary_locked_error() -> Error {
    Error::invalid_request("salary of an assigned user can only change through leave and join")
        .with_details(json!({
            "field": "salary",
            "code": "salary_locked",
        }))
}

fn contention_error(operation: &str) -> Error {
    Error::conflict(format!(
        "concurrent team updates outpaced {operation}; retry the request"
    ))
}

impl MembershipService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        teams: Arc<dyn TeamRepository>,
        store: Arc<dyn MembershipStore>,
    ) -> Self {
        Self {
            users,
            teams,
            store,
        }
    }

    async fn require_user(&self, id: UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| user_not_found(id))
    }

    async fn require_team(&self, id: TeamId) -> Result<Team, Error> {
        self.teams
            .find_by_id(id)
            .await
            .map_err(map_team_error)?
            .ok_or_else(|| team_not_found(id))
    }

    /// Every stored user.
    pub async fn list_users(&self) -> Result<Vec<User>, Error> {
        self.users.list().await.map_err(map_user_error)
    }

    /// A single user, or Not-Found.
    pub async fn get_user(&self, id: UserId) -> Result<User, Error> {
        self.require_user(id).await
    }

    /// Create a free agent. The draft type carries no assignment, so a
    /// caller cannot fabricate a membership on creation.
    pub async fn create_user(&self, draft: &UserDraft) -> Result<User, Error> {
        self.users.create(draft).await.map_err(map_user_error)
    }

    /// Full profile replace. Identity and assignment are preserved; a
    /// salary change is only honoured for free agents.
    pub async fn replace_user(&self, id: UserId, draft: &UserDraft) -> Result<User, Error> {
        let existing = self.require_user(id).await?;
        if !existing.is_free_agent() && draft.salary() != existing.salary() {
            return Err(salary_locked_error());
        }
        let replacement = existing.with_profile(draft);
        self.users
            .replace(&replacement)
            .await
            .map_err(map_user_error)
    }

    /// Partial update. `team_id` is not patchable at all; a salary change
    /// for an assigned user is rejected with Salary-Locked. The repository
    /// re-checks the free-agent condition inside the update itself, so a
    /// join racing this patch cannot slip a salary change through.
    pub async fn patch_user(&self, id: UserId, patch: &UserPatch) -> Result<User, Error> {
        let existing = self.require_user(id).await?;

        let effective = match (existing.team_id(), patch.salary()) {
            (Some(_), Some(salary)) if salary == existing.salary() => patch.without_salary(),
            (Some(_), Some(_)) => return Err(salary_locked_error()),
            _ => patch.clone(),
        };
        if effective.is_empty() {
            return Ok(existing);
        }

        match self
            .users
            .update_fields(id, &effective)
            .await
            .map_err(map_user_error)?
        {
            Some(user) => Ok(user),
            None => match self.users.find_by_id(id).await.map_err(map_user_error)? {
                None => Err(user_not_found(id)),
                Some(current) if effective.salary().is_some() && !current.is_free_agent() => {
                    Err(salary_locked_error())
                }
                Some(_) => Err(Error::conflict("user changed concurrently; retry the request")),
            },
        }
    }

    /// Delete a user. An assigned user's salary is released from their
    /// team's used budget in the same transaction as the row delete, so
    /// the budget sum never orphans.
    pub async fn delete_user(&self, id: UserId) -> Result<(), Error> {
        for attempt in 0..MAX_REVISION_RETRIES {
            let user = self.require_user(id).await?;

            let Some(team_id) = user.team_id() else {
                return self.delete_free_agent(id).await;
            };

            let Some(team) = self
                .teams
                .find_by_id(team_id)
                .await
                .map_err(map_team_error)?
            else {
                // Dangling assignment; free the row rather than wedge the delete.
                warn!(user = %id, team = %team_id, "assigned team missing, deleting user directly");
                return self.delete_free_agent(id).await;
            };

            let refunded = team.used_budget() - user.salary();
            if refunded < 0 {
                return Err(Error::internal(format!(
                    "used budget of team {team_id} would go negative"
                )));
            }
            let debited = team.with_used_budget(refunded);

            match self.store.delete_member(&user, &debited, team.revision()).await {
                Ok(()) => return Ok(()),
                Err(MembershipWriteError::RevisionMismatch { expected }) => {
                    debug!(team = %team_id, attempt, expected, "team revision moved, retrying user delete");
                }
                Err(other) => return Err(map_write_error(other)),
            }
        }
        Err(contention_error("the user delete"))
    }

    async fn delete_free_agent(&self, id: UserId) -> Result<(), Error> {
        if self.users.delete(id).await.map_err(map_user_error)? {
            Ok(())
        } else {
            Err(user_not_found(id))
        }
    }

    /// Create a team. The draft type carries no used budget, so new teams
    /// always start unused, whatever the caller sent on the wire.
    pub async fn create_team(&self, draft: &TeamDraft) -> Result<Team, Error> {
        self.teams.create(draft).await.map_err(map_team_error)
    }

    /// Every team with members, plus the synthetic free-agents roster.
    pub async fn list_teams(&self) -> Result<Vec<TeamRoster>, Error> {
        let mut rosters = self
            .teams
            .list_with_members()
            .await
            .map_err(map_team_error)?;
        let free_agents = self
            .users
            .list_free_agents()
            .await
            .map_err(map_user_error)?;
        rosters.push(TeamRoster::free_agents(free_agents));
        Ok(rosters)
    }

    /// Delete a team, freeing every member in the same transaction. Users
    /// survive their team; only the assignment is cleared.
    pub async fn delete_team(&self, id: TeamId) -> Result<TeamDeletion, Error> {
        for attempt in 0..MAX_REVISION_RETRIES {
            let team = self.require_team(id).await?;
            match self
                .store
                .delete_team_freeing_members(id, team.revision())
                .await
            {
                Ok(users_freed) => return Ok(TeamDeletion { team, users_freed }),
                Err(MembershipWriteError::RevisionMismatch { expected }) => {
                    debug!(team = %id, attempt, expected, "team revision moved, retrying team delete");
                }
                Err(other) => return Err(map_write_error(other)),
            }
        }
        Err(contention_error("the team delete"))
    }

    /// Add a free agent to a team.
    ///
    /// Fails Budget-Exceeded iff `used_budget + salary > budget`, carrying
    /// the four figures clients render; fails Already-Member when the user
    /// holds any assignment. Both checks run before any write, so failed
    /// joins never change state.
    pub async fn join(&self, team_id: TeamId, user_id: UserId) -> Result<JoinOutcome, Error> {
        for attempt in 0..MAX_REVISION_RETRIES {
            let team = self.require_team(team_id).await?;
            let user = self.require_user(user_id).await?;

            if let Some(current) = user.team_id() {
                return Err(already_member_error(current));
            }

            let would_need = team.used_budget() + user.salary();
            if would_need > team.budget() {
                return Err(budget_exceeded_error(&team, &user, would_need));
            }

            let member = user.assigned_to(team.id());
            let charged = team.with_used_budget(would_need);

            match self
                .store
                .commit_assignment(&member, &charged, team.revision())
                .await
            {
                Ok(()) => {
                    return Ok(JoinOutcome {
                        remaining_budget: charged.remaining_budget(),
                        user: member,
                        team: charged,
                    });
                }
                Err(MembershipWriteError::RevisionMismatch { expected }) => {
                    debug!(team = %team_id, attempt, expected, "team revision moved, retrying join");
                }
                Err(other) => return Err(map_write_error(other)),
            }
        }
        Err(contention_error("the join"))
    }

    /// Remove a member from their team, refunding the salary.
    ///
    /// Rejects with Not-A-Member unless the user's assignment actually
    /// names `team_id`; an unconditional clear could drive the used budget
    /// negative.
    pub async fn leave(&self, team_id: TeamId, user_id: UserId) -> Result<LeaveOutcome, Error> {
        for attempt in 0..MAX_REVISION_RETRIES {
            let team = self.require_team(team_id).await?;
            let user = self.require_user(user_id).await?;

            if user.team_id() != Some(team_id) {
                return Err(not_a_member_error(team_id));
            }

            let refunded = team.used_budget() - user.salary();
            if refunded < 0 {
                return Err(Error::internal(format!(
                    "used budget of team {team_id} would go negative"
                )));
            }

            let freed = user.released();
            let debited = team.with_used_budget(refunded);

            match self
                .store
                .commit_assignment(&freed, &debited, team.revision())
                .await
            {
                Ok(()) => {
                    return Ok(LeaveOutcome {
                        user: freed,
                        team: debited,
                    });
                }
                Err(MembershipWriteError::RevisionMismatch { expected }) => {
                    debug!(team = %team_id, attempt, expected, "team revision moved, retrying leave");
                }
                Err(other) => return Err(map_write_error(other)),
            }
        }
        Err(contention_error("the leave"))
    }
}
