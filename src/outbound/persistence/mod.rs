//! Diesel-backed PostgreSQL persistence adapters.
//!
//! Each adapter implements one domain port and maps pool and Diesel
//! failures into that port's typed errors. Multi-row membership writes go
//! through [`DieselMembershipStore`], which wraps them in a transaction
//! with an optimistic revision guard on the team row.

mod diesel_membership_store;
mod diesel_team_repository;
mod diesel_user_repository;
mod models;
mod pool;
pub mod schema;

pub use diesel_membership_store::DieselMembershipStore;
pub use diesel_team_repository::DieselTeamRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
