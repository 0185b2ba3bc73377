//! User aggregate.
//!
//! A user is created as a free agent and only becomes a team member through
//! the membership engine. `team_id` and `salary` changes for assigned users
//! never go through plain field writes; see [`crate::domain::MembershipService`].

use crate::domain::team::TeamId;

/// Store-assigned user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(i64);

impl UserId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors raised when constructing user values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Salaries are fixed cost contributions and can never be negative.
    #[error("salary must not be negative")]
    NegativeSalary,
}

/// A stored user record.
///
/// `team_id` is the membership back-reference: present iff the user is
/// currently on a team. Only the membership engine mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    name: String,
    age: i32,
    org: String,
    salary: i64,
    team_id: Option<TeamId>,
}

impl User {
    /// Reassemble a stored record. Used by persistence adapters and test
    /// doubles; rejects rows that violate the salary invariant.
    pub fn from_parts(
        id: UserId,
        name: impl Into<String>,
        age: i32,
        org: impl Into<String>,
        salary: i64,
        team_id: Option<TeamId>,
    ) -> Result<Self, UserValidationError> {
        if salary < 0 {
            return Err(UserValidationError::NegativeSalary);
        }
        Ok(Self {
            id,
            name: name.into(),
            age,
            org: org.into(),
            salary,
            team_id,
        })
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn org(&self) -> &str {
        self.org.as_str()
    }

    pub fn salary(&self) -> i64 {
        self.salary
    }

    pub fn team_id(&self) -> Option<TeamId> {
        self.team_id
    }

    /// A free agent carries no team assignment.
    pub fn is_free_agent(&self) -> bool {
        self.team_id.is_none()
    }

    /// The user with their assignment set. Engine-only transition.
    pub(crate) fn assigned_to(&self, team_id: TeamId) -> Self {
        let mut next = self.clone();
        next.team_id = Some(team_id);
        next
    }

    /// The user with their assignment cleared. Engine-only transition.
    pub(crate) fn released(&self) -> Self {
        let mut next = self.clone();
        next.team_id = None;
        next
    }

    /// The user with profile fields replaced and identity plus assignment
    /// preserved. Backs the full-replace operation.
    pub(crate) fn with_profile(&self, draft: &UserDraft) -> Self {
        Self {
            id: self.id,
            name: draft.name.clone(),
            age: draft.age,
            org: draft.org.clone(),
            salary: draft.salary,
            team_id: self.team_id,
        }
    }
}

/// Input for creating or fully replacing a user.
///
/// Deliberately has no `team_id` field: creation always yields a free agent
/// and replacement preserves the stored assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    name: String,
    age: i32,
    org: String,
    salary: i64,
}

impl UserDraft {
    pub fn new(
        name: impl Into<String>,
        age: i32,
        org: impl Into<String>,
        salary: i64,
    ) -> Result<Self, UserValidationError> {
        if salary < 0 {
            return Err(UserValidationError::NegativeSalary);
        }
        Ok(Self {
            name: name.into(),
            age,
            org: org.into(),
            salary,
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn org(&self) -> &str {
        self.org.as_str()
    }

    pub fn salary(&self) -> i64 {
        self.salary
    }
}

/// Typed partial update.
///
/// Enumerates exactly the fields eligible for PATCH; `team_id` is not one
/// of them, and a salary change is only honoured while the user is still a
/// free agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    name: Option<String>,
    age: Option<i32>,
    org: Option<String>,
    salary: Option<i64>,
}

impl UserPatch {
    pub fn new(
        name: Option<String>,
        age: Option<i32>,
        org: Option<String>,
        salary: Option<i64>,
    ) -> Result<Self, UserValidationError> {
        if matches!(salary, Some(value) if value < 0) {
            return Err(UserValidationError::NegativeSalary);
        }
        Ok(Self {
            name,
            age,
            org,
            salary,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn age(&self) -> Option<i32> {
        self.age
    }

    pub fn org(&self) -> Option<&str> {
        self.org.as_deref()
    }

    pub fn salary(&self) -> Option<i64> {
        self.salary
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.org.is_none() && self.salary.is_none()
    }

    /// The patch with any salary change dropped. Used when an assigned
    /// user's patch repeats their current salary verbatim.
    pub(crate) fn without_salary(&self) -> Self {
        let mut next = self.clone();
        next.salary = None;
        next
    }
}
