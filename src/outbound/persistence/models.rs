//! Row models mapping between Diesel and the domain aggregates.

use diesel::prelude::*;

use crate::domain::{
    Team, TeamId, TeamValidationError, User, UserId, UserPatch, UserValidationError,
};

use super::schema::{teams, users};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub org: String,
    pub salary: i64,
    pub team_id: Option<i64>,
}

impl TryFrom<UserRow> for User {
    type Error = UserValidationError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        User::from_parts(
            UserId::new(row.id),
            row.name,
            row.age,
            row.org,
            row.salary,
            row.team_id.map(TeamId::new),
        )
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow<'a> {
    pub name: &'a str,
    pub age: i32,
    pub org: &'a str,
    pub salary: i64,
    pub team_id: Option<i64>,
}

/// Changeset for partial user updates; `None` leaves a column untouched.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserRowChanges<'a> {
    pub name: Option<&'a str>,
    pub age: Option<i32>,
    pub org: Option<&'a str>,
    pub salary: Option<i64>,
}

impl<'a> UserRowChanges<'a> {
    pub fn from_patch(patch: &'a UserPatch) -> Self {
        Self {
            name: patch.name(),
            age: patch.age(),
            org: patch.org(),
            salary: patch.salary(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = teams)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TeamRow {
    pub id: i64,
    pub name: String,
    pub budget: i64,
    pub used_budget: i64,
    pub revision: i32,
}

impl TryFrom<TeamRow> for Team {
    type Error = TeamValidationError;

    fn try_from(row: TeamRow) -> Result<Self, Self::Error> {
        Team::from_parts(
            TeamId::new(row.id),
            row.name,
            row.budget,
            row.used_budget,
            revision_from_db(row.revision),
        )
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = teams)]
pub struct NewTeamRow<'a> {
    pub name: &'a str,
    pub budget: i64,
    pub used_budget: i64,
    pub revision: i32,
}

#[expect(
    clippy::cast_sign_loss,
    reason = "revision is always non-negative in the database"
)]
pub(crate) fn revision_from_db(revision: i32) -> u32 {
    revision as u32
}

#[expect(
    clippy::cast_possible_wrap,
    reason = "revisions are small positive counters"
)]
pub(crate) fn revision_to_db(revision: u32) -> i32 {
    revision as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn user_rows_convert_to_domain_users() {
        let row = UserRow {
            id: 3,
            name: "Ada".into(),
            age: 36,
            org: "acme".into(),
            salary: 600,
            team_id: Some(7),
        };
        let user = User::try_from(row).expect("valid row");
        assert_eq!(user.id(), UserId::new(3));
        assert_eq!(user.team_id(), Some(TeamId::new(7)));
    }

    #[rstest]
    fn corrupt_user_rows_are_rejected() {
        let row = UserRow {
            id: 3,
            name: "Ada".into(),
            age: 36,
            org: "acme".into(),
            salary: -1,
            team_id: None,
        };
        assert!(User::try_from(row).is_err());
    }

    #[rstest]
    fn team_rows_convert_with_their_revision() {
        let row = TeamRow {
            id: 1,
            name: "Core".into(),
            budget: 1000,
            used_budget: 400,
            revision: 9,
        };
        let team = Team::try_from(row).expect("valid row");
        assert_eq!(team.revision(), 9);
        assert_eq!(team.remaining_budget(), 600);
    }

    #[rstest]
    fn over_budget_rows_are_rejected() {
        let row = TeamRow {
            id: 1,
            name: "Core".into(),
            budget: 100,
            used_budget: 200,
            revision: 0,
        };
        assert!(Team::try_from(row).is_err());
    }
}
