//! Team aggregate.
//!
//! A team carries a budget ceiling and a running `used_budget` that must
//! always equal the salary sum of its members. Membership itself is a
//! derived view (users referencing the team), not a stored edge list.

use crate::domain::user::User;

/// Name of the synthetic pseudo-team listing every unassigned user.
pub const FREE_AGENTS_TEAM_NAME: &str = "Free Agents";

/// Store-assigned team identifier. Id `0` is reserved for the synthetic
/// free-agents roster and never exists in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeamId(i64);

impl TeamId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TeamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors raised when constructing team values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TeamValidationError {
    #[error("budget must not be negative")]
    NegativeBudget,
    #[error("used budget must not be negative")]
    NegativeUsedBudget,
    #[error("used budget must not exceed the budget ceiling")]
    UsedBudgetExceedsBudget,
}

/// A stored team record.
///
/// `revision` is the optimistic-concurrency counter checked by every
/// budget-mutating write; it never travels to clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    id: TeamId,
    name: String,
    budget: i64,
    used_budget: i64,
    revision: u32,
}

impl Team {
    /// Reassemble a stored record. Used by persistence adapters and test
    /// doubles; rejects rows that violate the budget invariants.
    pub fn from_parts(
        id: TeamId,
        name: impl Into<String>,
        budget: i64,
        used_budget: i64,
        revision: u32,
    ) -> Result<Self, TeamValidationError> {
        if budget < 0 {
            return Err(TeamValidationError::NegativeBudget);
        }
        if used_budget < 0 {
            return Err(TeamValidationError::NegativeUsedBudget);
        }
        if used_budget > budget {
            return Err(TeamValidationError::UsedBudgetExceedsBudget);
        }
        Ok(Self {
            id,
            name: name.into(),
            budget,
            used_budget,
            revision,
        })
    }

    pub fn id(&self) -> TeamId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn budget(&self) -> i64 {
        self.budget
    }

    pub fn used_budget(&self) -> i64 {
        self.used_budget
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Budget still available for new members.
    pub fn remaining_budget(&self) -> i64 {
        self.budget - self.used_budget
    }

    /// The team with `used_budget` rewritten and the revision bumped for
    /// the optimistic write guard. Engine-only transition; callers must
    /// have validated the new figure against the ceiling.
    pub(crate) fn with_used_budget(&self, used_budget: i64) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            budget: self.budget,
            used_budget,
            revision: self.revision.wrapping_add(1),
        }
    }
}

/// Input for creating a team.
///
/// Has no `used_budget` field: new teams always start unused, whatever the
/// caller sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamDraft {
    name: String,
    budget: i64,
}

impl TeamDraft {
    pub fn new(name: impl Into<String>, budget: i64) -> Result<Self, TeamValidationError> {
        if budget < 0 {
            return Err(TeamValidationError::NegativeBudget);
        }
        Ok(Self {
            name: name.into(),
            budget,
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn budget(&self) -> i64 {
        self.budget
    }
}

/// A team together with its eagerly loaded members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRoster {
    pub team: Team,
    pub members: Vec<User>,
}

impl TeamRoster {
    pub fn new(team: Team, members: Vec<User>) -> Self {
        Self { team, members }
    }

    /// The synthetic roster of unassigned users appended to team listings.
    pub fn free_agents(members: Vec<User>) -> Self {
        let team = Team::from_parts(TeamId::new(0), FREE_AGENTS_TEAM_NAME, 0, 0, 0)
            .expect("zero budgets satisfy the team invariants");
        Self { team, members }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(-1, 0, TeamValidationError::NegativeBudget)]
    #[case(100, -1, TeamValidationError::NegativeUsedBudget)]
    #[case(100, 101, TeamValidationError::UsedBudgetExceedsBudget)]
    fn rejects_invalid_budgets(
        #[case] budget: i64,
        #[case] used: i64,
        #[case] expected: TeamValidationError,
    ) {
        let err = Team::from_parts(TeamId::new(1), "Core", budget, used, 0)
            .expect_err("invalid budgets rejected");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn rebudgeting_bumps_the_revision() {
        let team = Team::from_parts(TeamId::new(1), "Core", 1000, 0, 4).expect("valid team");
        let charged = team.with_used_budget(600);
        assert_eq!(charged.used_budget(), 600);
        assert_eq!(charged.revision(), 5);
        assert_eq!(charged.remaining_budget(), 400);
    }

    #[rstest]
    fn free_agents_roster_uses_the_reserved_id() {
        let roster = TeamRoster::free_agents(Vec::new());
        assert_eq!(roster.team.id(), TeamId::new(0));
        assert_eq!(roster.team.name(), FREE_AGENTS_TEAM_NAME);
        assert_eq!(roster.team.budget(), 0);
    }
}
