//! Teams API handlers.
//!
//! ```text
//! POST   /teams                      (admin)
//! GET    /teams
//! DELETE /teams/{team_id}            (admin)
//! POST   /teams/{team_id}/{user_id}  join
//! DELETE /teams/{team_id}/{user_id}  leave
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{Error, Team, TeamDraft, TeamRoster, TeamValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::admin::AdminKey;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::UserResponse;
use crate::inbound::http::validation::{parse_team_id, parse_user_id};

/// Request body for `POST /teams`.
///
/// Carries no used-budget field; any value a client sends under other keys
/// is ignored and new teams always start unused.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub name: String,
    pub budget: i64,
}

impl TryFrom<CreateTeamRequest> for TeamDraft {
    type Error = TeamValidationError;

    fn try_from(value: CreateTeamRequest) -> Result<Self, Self::Error> {
        TeamDraft::new(value.name, value.budget)
    }
}

/// Team payload without members.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamResponse {
    pub id: i64,
    pub name: String,
    pub budget: i64,
    pub used_budget: i64,
}

impl From<Team> for TeamResponse {
    fn from(value: Team) -> Self {
        Self {
            id: value.id().value(),
            name: value.name().to_owned(),
            budget: value.budget(),
            used_budget: value.used_budget(),
        }
    }
}

/// Team payload with members, as returned by the listing. The final entry
/// is always the synthetic free-agents roster.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamRosterResponse {
    pub id: i64,
    pub name: String,
    pub budget: i64,
    pub used_budget: i64,
    pub users: Vec<UserResponse>,
}

impl From<TeamRoster> for TeamRosterResponse {
    fn from(value: TeamRoster) -> Self {
        Self {
            id: value.team.id().value(),
            name: value.team.name().to_owned(),
            budget: value.team.budget(),
            used_budget: value.team.used_budget(),
            users: value.members.into_iter().map(UserResponse::from).collect(),
        }
    }
}

/// Response for a successful join.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub message: String,
    pub user: UserResponse,
    pub team: TeamResponse,
    pub team_budget_remaining: i64,
}

/// Response for a successful leave.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveResponse {
    pub message: String,
    pub user: UserResponse,
    pub team: TeamResponse,
}

/// Response for a successful team deletion.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamDeletionResponse {
    pub message: String,
    pub team: String,
    pub users_freed: u64,
}

fn map_team_validation_error(err: TeamValidationError) -> Error {
    match err {
        TeamValidationError::NegativeBudget => {
            Error::invalid_request("budget must not be negative").with_details(json!({
                "field": "budget",
                "code": "negative_budget",
            }))
        }
        // Drafts only carry a ceiling; the used-budget variants cannot
        // surface from request validation.
        other => Error::invalid_request(other.to_string()),
    }
}

/// Create a team. Admin gated.
#[utoipa::path(
    post,
    path = "/teams",
    request_body = CreateTeamRequest,
    responses(
        (status = 201, description = "Team created", body = TeamResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Admin key missing or wrong", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["teams"],
    operation_id = "createTeam"
)]
#[post("/teams")]
pub async fn create_team(
    state: web::Data<HttpState>,
    _admin: AdminKey,
    payload: web::Json<CreateTeamRequest>,
) -> ApiResult<HttpResponse> {
    let draft = TeamDraft::try_from(payload.into_inner()).map_err(map_team_validation_error)?;
    let team = state.membership.create_team(&draft).await?;
    Ok(HttpResponse::Created().json(TeamResponse::from(team)))
}

/// List every team with its members, plus the free-agents roster.
#[utoipa::path(
    get,
    path = "/teams",
    responses(
        (status = 200, description = "Teams with members", body = [TeamRosterResponse]),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["teams"],
    operation_id = "listTeams"
)]
#[get("/teams")]
pub async fn list_teams(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<TeamRosterResponse>>> {
    let rosters = state.membership.list_teams().await?;
    Ok(web::Json(
        rosters.into_iter().map(TeamRosterResponse::from).collect(),
    ))
}

/// Delete a team and free its members. Admin gated.
#[utoipa::path(
    delete,
    path = "/teams/{team_id}",
    params(("team_id" = String, Path, description = "Team identifier")),
    responses(
        (status = 200, description = "Team deleted, members freed", body = TeamDeletionResponse),
        (status = 400, description = "Malformed id", body = Error),
        (status = 403, description = "Admin key missing or wrong", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["teams"],
    operation_id = "deleteTeam"
)]
#[delete("/teams/{team_id}")]
pub async fn delete_team(
    state: web::Data<HttpState>,
    _admin: AdminKey,
    path: web::Path<String>,
) -> ApiResult<web::Json<TeamDeletionResponse>> {
    let id = parse_team_id(&path.into_inner(), "team_id")?;
    let deletion = state.membership.delete_team(id).await?;
    Ok(web::Json(TeamDeletionResponse {
        message: "Team deleted and users freed".to_owned(),
        team: deletion.team.name().to_owned(),
        users_freed: deletion.users_freed,
    }))
}

/// Add a free agent to a team, charging their salary against the budget.
#[utoipa::path(
    post,
    path = "/teams/{team_id}/{user_id}",
    params(
        ("team_id" = String, Path, description = "Team identifier"),
        ("user_id" = String, Path, description = "User identifier")
    ),
    responses(
        (status = 200, description = "User added to the team", body = JoinResponse),
        (status = 400, description = "Budget exceeded or already a member", body = Error),
        (status = 404, description = "Team or user not found", body = Error),
        (status = 409, description = "Concurrent updates kept winning", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["teams"],
    operation_id = "joinTeam"
)]
#[post("/teams/{team_id}/{user_id}")]
pub async fn join_team(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<JoinResponse>> {
    let (raw_team, raw_user) = path.into_inner();
    let team_id = parse_team_id(&raw_team, "team_id")?;
    let user_id = parse_user_id(&raw_user, "user_id")?;

    let outcome = state.membership.join(team_id, user_id).await?;
    Ok(web::Json(JoinResponse {
        message: "User added to team successfully".to_owned(),
        team_budget_remaining: outcome.remaining_budget,
        user: outcome.user.into(),
        team: outcome.team.into(),
    }))
}

/// Remove a member from a team, refunding their salary.
#[utoipa::path(
    delete,
    path = "/teams/{team_id}/{user_id}",
    params(
        ("team_id" = String, Path, description = "Team identifier"),
        ("user_id" = String, Path, description = "User identifier")
    ),
    responses(
        (status = 200, description = "User removed from the team", body = LeaveResponse),
        (status = 400, description = "User is not a member of this team", body = Error),
        (status = 404, description = "Team or user not found", body = Error),
        (status = 409, description = "Concurrent updates kept winning", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["teams"],
    operation_id = "leaveTeam"
)]
#[delete("/teams/{team_id}/{user_id}")]
pub async fn leave_team(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<LeaveResponse>> {
    let (raw_team, raw_user) = path.into_inner();
    let team_id = parse_team_id(&raw_team, "team_id")?;
    let user_id = parse_user_id(&raw_user, "user_id")?;

    let outcome = state.membership.leave(team_id, user_id).await?;
    Ok(web::Json(LeaveResponse {
        message: "User removed from team".to_owned(),
        user: outcome.user.into(),
        team: outcome.team.into(),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test as actix_test, web};
    use serde_json::{Value, json};

    use super::*;
    use crate::inbound::http::admin::{ADMIN_KEY_HEADER, AdminGate};
    use crate::inbound::http::users::create_user;
    use crate::test_support::{InMemoryRoster, membership_service};

    const TEST_ADMIN_KEY: &str = "roster-admin-secret";

    fn state(roster: &InMemoryRoster) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(Arc::new(membership_service(roster))))
    }

    macro_rules! teams_app {
        ($roster:expr) => {
            actix_test::init_service(
                App::new()
                    .app_data(state($roster))
                    .app_data(web::Data::new(AdminGate::new(TEST_ADMIN_KEY)))
                    .service(create_user)
                    .service(create_team)
                    .service(list_teams)
                    .service(join_team)
                    .service(leave_team)
                    .service(delete_team),
            )
            .await
        };
    }

    async fn seed_team<S>(app: &S, name: &str, budget: i64) -> Value
    where
        S: actix_web::dev::Service<
                actix_http::Request,
                Response = actix_web::dev::ServiceResponse,
                Error = actix_web::Error,
            >,
    {
        let request = actix_test::TestRequest::post()
            .uri("/teams")
            .insert_header((ADMIN_KEY_HEADER, TEST_ADMIN_KEY))
            .set_json(json!({ "name": name, "budget": budget }))
            .to_request();
        let response = actix_test::call_service(app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        actix_test::read_body_json(response).await
    }

    async fn seed_user<S>(app: &S, name: &str, salary: i64) -> Value
    where
        S: actix_web::dev::Service<
                actix_http::Request,
                Response = actix_web::dev::ServiceResponse,
                Error = actix_web::Error,
            >,
    {
        let request = actix_test::TestRequest::post()
            .uri("/users")
            .set_json(json!({ "name": name, "age": 30, "org": "acme", "salary": salary }))
            .to_request();
        let response = actix_test::call_service(app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        actix_test::read_body_json(response).await
    }

    #[actix_web::test]
    async fn team_management_requires_the_admin_key() {
        let roster = InMemoryRoster::default();
        let app = teams_app!(&roster);

        let no_key = actix_test::TestRequest::post()
            .uri("/teams")
            .set_json(json!({ "name": "Core", "budget": 1000 }))
            .to_request();
        let response = actix_test::call_service(&app, no_key).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let wrong_key = actix_test::TestRequest::delete()
            .uri("/teams/1")
            .insert_header((ADMIN_KEY_HEADER, "guess"))
            .to_request();
        let response = actix_test::call_service(&app, wrong_key).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["code"], "forbidden");
    }

    #[actix_web::test]
    async fn create_ignores_any_used_budget_from_the_wire() {
        let roster = InMemoryRoster::default();
        let app = teams_app!(&roster);

        let request = actix_test::TestRequest::post()
            .uri("/teams")
            .insert_header((ADMIN_KEY_HEADER, TEST_ADMIN_KEY))
            .set_json(json!({ "name": "Core", "budget": 1000, "usedBudget": 900 }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["usedBudget"], 0);
    }

    #[actix_web::test]
    async fn join_charges_the_budget_and_reports_the_remainder() {
        let roster = InMemoryRoster::default();
        let app = teams_app!(&roster);
        let team = seed_team(&app, "Core", 1000).await;
        let user = seed_user(&app, "Ada", 600).await;

        let request = actix_test::TestRequest::post()
            .uri(&format!("/teams/{}/{}", team["id"], user["id"]))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["message"], "User added to team successfully");
        assert_eq!(body["teamBudgetRemaining"], 400);
        assert_eq!(body["team"]["usedBudget"], 600);
        assert_eq!(body["user"]["teamId"], team["id"]);
    }

    #[actix_web::test]
    async fn join_surfaces_the_budget_diagnostics() {
        let roster = InMemoryRoster::default();
        let app = teams_app!(&roster);
        let team = seed_team(&app, "Core", 1000).await;
        let first = seed_user(&app, "Ada", 600).await;
        let second = seed_user(&app, "Grace", 500).await;

        let join = |user: &Value| {
            actix_test::TestRequest::post()
                .uri(&format!("/teams/{}/{}", team["id"], user["id"]))
                .to_request()
        };

        let response = actix_test::call_service(&app, join(&first)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = actix_test::call_service(&app, join(&second)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["code"], "invalid_request");
        assert_eq!(body["details"]["budget"], 1000);
        assert_eq!(body["details"]["current_used"], 600);
        assert_eq!(body["details"]["user_salary"], 500);
        assert_eq!(body["details"]["would_need"], 1100);
    }

    #[actix_web::test]
    async fn join_requires_existing_records() {
        let roster = InMemoryRoster::default();
        let app = teams_app!(&roster);
        let team = seed_team(&app, "Core", 1000).await;

        let request = actix_test::TestRequest::post()
            .uri(&format!("/teams/{}/42", team["id"]))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let request = actix_test::TestRequest::post()
            .uri("/teams/nine/1")
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn leave_refunds_the_budget() {
        let roster = InMemoryRoster::default();
        let app = teams_app!(&roster);
        let team = seed_team(&app, "Core", 1000).await;
        let user = seed_user(&app, "Ada", 600).await;

        let join = actix_test::TestRequest::post()
            .uri(&format!("/teams/{}/{}", team["id"], user["id"]))
            .to_request();
        assert!(actix_test::call_service(&app, join).await.status().is_success());

        let leave = actix_test::TestRequest::delete()
            .uri(&format!("/teams/{}/{}", team["id"], user["id"]))
            .to_request();
        let response = actix_test::call_service(&app, leave).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["message"], "User removed from team");
        assert_eq!(body["team"]["usedBudget"], 0);
        assert_eq!(body["user"]["teamId"], Value::Null);
    }

    #[actix_web::test]
    async fn leave_rejects_non_members() {
        let roster = InMemoryRoster::default();
        let app = teams_app!(&roster);
        let team = seed_team(&app, "Core", 1000).await;
        let user = seed_user(&app, "Ada", 600).await;

        let leave = actix_test::TestRequest::delete()
            .uri(&format!("/teams/{}/{}", team["id"], user["id"]))
            .to_request();
        let response = actix_test::call_service(&app, leave).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["details"]["code"], "not_a_member");
    }

    #[actix_web::test]
    async fn listing_includes_members_and_the_free_agents_roster() {
        let roster = InMemoryRoster::default();
        let app = teams_app!(&roster);
        let team = seed_team(&app, "Core", 1000).await;
        let member = seed_user(&app, "Ada", 600).await;
        seed_user(&app, "Grace", 300).await;

        let join = actix_test::TestRequest::post()
            .uri(&format!("/teams/{}/{}", team["id"], member["id"]))
            .to_request();
        assert!(actix_test::call_service(&app, join).await.status().is_success());

        let response =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/teams").to_request())
                .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        let rosters = body.as_array().expect("array");
        assert_eq!(rosters.len(), 2);
        assert_eq!(rosters[0]["name"], "Core");
        assert_eq!(rosters[0]["users"][0]["name"], "Ada");
        assert_eq!(rosters[1]["name"], "Free Agents");
        assert_eq!(rosters[1]["id"], 0);
        assert_eq!(rosters[1]["users"][0]["name"], "Grace");
    }

    #[actix_web::test]
    async fn delete_frees_members_and_drops_the_team_from_listings() {
        let roster = InMemoryRoster::default();
        let app = teams_app!(&roster);
        let team = seed_team(&app, "Core", 1000).await;
        let user = seed_user(&app, "Ada", 600).await;

        let join = actix_test::TestRequest::post()
            .uri(&format!("/teams/{}/{}", team["id"], user["id"]))
            .to_request();
        assert!(actix_test::call_service(&app, join).await.status().is_success());

        let request = actix_test::TestRequest::delete()
            .uri(&format!("/teams/{}", team["id"]))
            .insert_header((ADMIN_KEY_HEADER, TEST_ADMIN_KEY))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["message"], "Team deleted and users freed");
        assert_eq!(body["team"], "Core");
        assert_eq!(body["usersFreed"], 1);

        let response =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/teams").to_request())
                .await;
        let listing: Value = actix_test::read_body_json(response).await;
        let rosters = listing.as_array().expect("array");
        assert_eq!(rosters.len(), 1, "only the free agents roster remains");
        assert_eq!(rosters[0]["users"][0]["teamId"], Value::Null);
    }

    #[actix_web::test]
    async fn delete_requires_an_existing_team() {
        let roster = InMemoryRoster::default();
        let app = teams_app!(&roster);

        let request = actix_test::TestRequest::delete()
            .uri("/teams/9")
            .insert_header((ADMIN_KEY_HEADER, TEST_ADMIN_KEY))
            .to_request();
        let response = actix_test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
