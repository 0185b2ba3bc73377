//! Domain entities and the membership engine.
//!
//! Everything here is transport and storage agnostic. The inbound HTTP
//! adapter maps these types onto the wire; the outbound persistence
//! adapters implement the ports in [`ports`].

pub mod error;
pub mod membership;
pub mod ports;
pub mod team;
pub mod user;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::membership::{
    JoinOutcome, LeaveOutcome, MembershipService, TeamDeletion,
};
pub use self::team::{
    FREE_AGENTS_TEAM_NAME, Team, TeamDraft, TeamId, TeamRoster, TeamValidationError,
};
pub use self::user::{User, UserDraft, UserId, UserPatch, UserValidationError};

/// Convenient result alias for operations that fail with [`Error`].
///
/// # Examples
/// ```
/// use rosterd::domain::{ApiResult, Error};
///
/// fn guard(allowed: bool) -> ApiResult<()> {
///     if allowed { Ok(()) } else { Err(Error::forbidden("nope")) }
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
