//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the membership engine expects to interact with the
//! persistence layer. Each trait exposes strongly typed errors so adapters
//! map their failures into predictable variants instead of returning an
//! opaque catch-all.

mod membership_store;
mod team_repository;
mod user_repository;

pub use membership_store::{MembershipStore, MembershipWriteError};
pub use team_repository::{TeamPersistenceError, TeamRepository};
pub use user_repository::{UserPersistenceError, UserRepository};
