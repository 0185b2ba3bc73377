//! OpenAPI document aggregating every endpoint and schema.

use utoipa::OpenApi;

use crate::domain::error::{Error, ErrorCode};
use crate::inbound::http::{health, teams, users};

#[derive(OpenApi)]
#[openapi(
    paths(
        users::list_users,
        users::get_user,
        users::create_user,
        users::replace_user,
        users::patch_user,
        users::delete_user,
        teams::create_team,
        teams::list_teams,
        teams::delete_team,
        teams::join_team,
        teams::leave_team,
        health::live,
        health::ready,
    ),
    components(schemas(
        Error,
        ErrorCode,
        users::UserProfileRequest,
        users::UserPatchRequest,
        users::UserResponse,
        teams::CreateTeamRequest,
        teams::TeamResponse,
        teams::TeamRosterResponse,
        teams::JoinResponse,
        teams::LeaveResponse,
        teams::TeamDeletionResponse,
    )),
    tags(
        (name = "users", description = "User management"),
        (name = "teams", description = "Team management and membership"),
        (name = "health", description = "Liveness and readiness probes"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in [
            "/users",
            "/users/{id}",
            "/teams",
            "/teams/{team_id}",
            "/teams/{team_id}/{user_id}",
            "/health/live",
            "/health/ready",
        ] {
            assert!(
                paths.iter().any(|path| path.as_str() == expected),
                "missing path {expected}"
            );
        }
    }
}
