//! Diesel table definitions for the PostgreSQL schema.
//!
//! These must match the SQL migrations exactly; regenerate with
//! `diesel print-schema` after a migration changes the layout.

diesel::table! {
    /// Teams with their budget ceiling and running used budget.
    teams (id) {
        /// Primary key (bigserial).
        id -> Int8,
        name -> Varchar,
        /// Budget ceiling; non-negative.
        budget -> Int8,
        /// Running sum of member salaries; `0 <= used_budget <= budget`.
        used_budget -> Int8,
        /// Optimistic concurrency counter bumped by every budget write.
        revision -> Int4,
    }
}

diesel::table! {
    /// Users, free agents or members of one team.
    users (id) {
        /// Primary key (bigserial).
        id -> Int8,
        name -> Varchar,
        age -> Int4,
        org -> Varchar,
        /// Fixed cost contribution; non-negative.
        salary -> Int8,
        /// Membership back-reference; null for free agents.
        team_id -> Nullable<Int8>,
    }
}

diesel::joinable!(users -> teams (team_id));
diesel::allow_tables_to_appear_in_same_query!(teams, users);
