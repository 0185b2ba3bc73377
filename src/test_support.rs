//! In-memory port implementations shared by unit and integration tests.
//!
//! One fake backs all three persistence ports so cross-port consistency
//! (the budget counter versus actual membership) stays observable.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    MembershipStore, MembershipWriteError, TeamPersistenceError, TeamRepository,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    MembershipService, Team, TeamDraft, TeamId, TeamRoster, User, UserDraft, UserId, UserPatch,
};

#[derive(Default)]
struct RosterState {
    users: BTreeMap<i64, User>,
    teams: BTreeMap<i64, Team>,
    next_user_id: i64,
    next_team_id: i64,
    /// Commits to fail with a revision mismatch before letting writes through.
    contended_commits: u32,
    commits: u32,
}

/// In-memory roster store implementing every persistence port.
#[derive(Default, Clone)]
pub struct InMemoryRoster {
    state: Arc<Mutex<RosterState>>,
}

impl InMemoryRoster {
    fn lock(&self) -> MutexGuard<'_, RosterState> {
        self.state.lock().expect("roster state poisoned")
    }

    /// Fail the next `count` store commits with a revision mismatch.
    pub fn contend_commits(&self, count: u32) {
        self.lock().contended_commits = count;
    }

    /// Number of store commits that went through.
    pub fn commits(&self) -> u32 {
        self.lock().commits
    }

    pub fn user(&self, id: UserId) -> Option<User> {
        self.lock().users.get(&id.value()).cloned()
    }

    pub fn team(&self, id: TeamId) -> Option<Team> {
        self.lock().teams.get(&id.value()).cloned()
    }

    /// Assert `used_budget == sum(salaries of members)` for every team.
    pub fn assert_budget_invariant(&self) {
        let state = self.lock();
        for team in state.teams.values() {
            let total: i64 = state
                .users
                .values()
                .filter(|user| user.team_id() == Some(team.id()))
                .map(User::salary)
                .sum();
            assert_eq!(
                team.used_budget(),
                total,
                "team {} budget counter drifted from membership",
                team.id()
            );
            assert!(team.used_budget() >= 0);
            assert!(team.used_budget() <= team.budget());
        }
    }
}

/// A membership service wired entirely onto `roster`.
pub fn membership_service(roster: &InMemoryRoster) -> MembershipService {
    MembershipService::new(
        Arc::new(roster.clone()),
        Arc::new(roster.clone()),
        Arc::new(roster.clone()),
    )
}

#[async_trait]
impl UserRepository for InMemoryRoster {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.lock().users.get(&id.value()).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        Ok(self.lock().users.values().cloned().collect())
    }

    async fn list_free_agents(&self) -> Result<Vec<User>, UserPersistenceError> {
        Ok(self
            .lock()
            .users
            .values()
            .filter(|user| user.is_free_agent())
            .cloned()
            .collect())
    }

    async fn create(&self, draft: &UserDraft) -> Result<User, UserPersistenceError> {
        let mut state = self.lock();
        state.next_user_id += 1;
        let user = User::from_parts(
            UserId::new(state.next_user_id),
            draft.name(),
            draft.age(),
            draft.org(),
            draft.salary(),
            None,
        )
        .map_err(|err| UserPersistenceError::query(err.to_string()))?;
        state.users.insert(user.id().value(), user.clone());
        Ok(user)
    }

    async fn replace(&self, user: &User) -> Result<User, UserPersistenceError> {
        let mut state = self.lock();
        let stored_team = state
            .users
            .get(&user.id().value())
            .ok_or_else(|| UserPersistenceError::query("record not found"))?
            .team_id();
        let next = User::from_parts(
            user.id(),
            user.name(),
            user.age(),
            user.org(),
            user.salary(),
            stored_team,
        )
        .map_err(|err| UserPersistenceError::query(err.to_string()))?;
        state.users.insert(next.id().value(), next.clone());
        Ok(next)
    }

    async fn update_fields(
        &self,
        id: UserId,
        patch: &UserPatch,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut state = self.lock();
        let Some(stored) = state.users.get(&id.value()).cloned() else {
            return Ok(None);
        };
        if patch.salary().is_some() && !stored.is_free_agent() {
            return Ok(None);
        }
        let next = User::from_parts(
            id,
            patch.name().unwrap_or(stored.name()),
            patch.age().unwrap_or(stored.age()),
            patch.org().unwrap_or(stored.org()),
            patch.salary().unwrap_or(stored.salary()),
            stored.team_id(),
        )
        .map_err(|err| UserPersistenceError::query(err.to_string()))?;
        state.users.insert(id.value(), next.clone());
        Ok(Some(next))
    }

    async fn delete(&self, id: UserId) -> Result<bool, UserPersistenceError> {
        Ok(self.lock().users.remove(&id.value()).is_some())
    }
}

#[async_trait]
impl TeamRepository for InMemoryRoster {
    async fn find_by_id(&self, id: TeamId) -> Result<Option<Team>, TeamPersistenceError> {
        Ok(self.lock().teams.get(&id.value()).cloned())
    }

    async fn list_with_members(&self) -> Result<Vec<TeamRoster>, TeamPersistenceError> {
        let state = self.lock();
        Ok(state
            .teams
            .values()
            .map(|team| {
                let members = state
                    .users
                    .values()
                    .filter(|user| user.team_id() == Some(team.id()))
                    .cloned()
                    .collect();
                TeamRoster::new(team.clone(), members)
            })
            .collect())
    }

    async fn create(&self, draft: &TeamDraft) -> Result<Team, TeamPersistenceError> {
        let mut state = self.lock();
        state.next_team_id += 1;
        let team = Team::from_parts(
            TeamId::new(state.next_team_id),
            draft.name(),
            draft.budget(),
            0,
            0,
        )
        .map_err(|err| TeamPersistenceError::query(err.to_string()))?;
        state.teams.insert(team.id().value(), team.clone());
        Ok(team)
    }
}

impl RosterState {
    fn guard_revision(
        &mut self,
        team_id: TeamId,
        expected_revision: u32,
    ) -> Result<(), MembershipWriteError> {
        if self.contended_commits > 0 {
            self.contended_commits -= 1;
            return Err(MembershipWriteError::revision_mismatch(expected_revision));
        }
        let stored = self
            .teams
            .get(&team_id.value())
            .ok_or_else(|| MembershipWriteError::query("team row missing"))?;
        if stored.revision() != expected_revision {
            return Err(MembershipWriteError::revision_mismatch(expected_revision));
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for InMemoryRoster {
    async fn commit_assignment(
        &self,
        user: &User,
        team: &Team,
        expected_revision: u32,
    ) -> Result<(), MembershipWriteError> {
        let mut state = self.lock();
        state.guard_revision(team.id(), expected_revision)?;
        if !state.users.contains_key(&user.id().value()) {
            return Err(MembershipWriteError::query("user row missing"));
        }
        state.users.insert(user.id().value(), user.clone());
        state.teams.insert(team.id().value(), team.clone());
        state.commits += 1;
        Ok(())
    }

    async fn delete_team_freeing_members(
        &self,
        team_id: TeamId,
        expected_revision: u32,
    ) -> Result<u64, MembershipWriteError> {
        let mut state = self.lock();
        state.guard_revision(team_id, expected_revision)?;
        let members: Vec<i64> = state
            .users
            .values()
            .filter(|user| user.team_id() == Some(team_id))
            .map(|user| user.id().value())
            .collect();
        let freed = members.len() as u64;
        for id in members {
            let released = state.users[&id].released();
            state.users.insert(id, released);
        }
        state.teams.remove(&team_id.value());
        state.commits += 1;
        Ok(freed)
    }

    async fn delete_member(
        &self,
        user: &User,
        team: &Team,
        expected_revision: u32,
    ) -> Result<(), MembershipWriteError> {
        let mut state = self.lock();
        state.guard_revision(team.id(), expected_revision)?;
        state.users.remove(&user.id().value());
        state.teams.insert(team.id().value(), team.clone());
        state.commits += 1;
        Ok(())
    }
}
