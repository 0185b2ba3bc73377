//! Users API handlers.
//!
//! ```text
//! GET    /users
//! GET    /users/{id}
//! POST   /users
//! PUT    /users/{id}
//! PATCH  /users/{id}
//! DELETE /users/{id}
//! ```
//!
//! Creation always yields a free agent, and neither replace nor patch can
//! touch `team_id`; membership moves only through the team routes.

use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{Error, User, UserDraft, UserPatch, UserValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_user_id;

/// Request body for `POST /users` and `PUT /users/{id}`.
///
/// Deliberately has no `teamId` field.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileRequest {
    pub name: String,
    pub age: i32,
    pub org: String,
    pub salary: i64,
}

impl TryFrom<UserProfileRequest> for UserDraft {
    type Error = UserValidationError;

    fn try_from(value: UserProfileRequest) -> Result<Self, Self::Error> {
        UserDraft::new(value.name, value.age, value.org, value.salary)
    }
}

/// Request body for `PATCH /users/{id}`. Only these fields are patchable.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPatchRequest {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub org: Option<String>,
    pub salary: Option<i64>,
}

impl TryFrom<UserPatchRequest> for UserPatch {
    type Error = UserValidationError;

    fn try_from(value: UserPatchRequest) -> Result<Self, Self::Error> {
        UserPatch::new(value.name, value.age, value.org, value.salary)
    }
}

/// User payload returned by every user-bearing endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub org: String,
    pub salary: i64,
    /// Absent assignment serialises as `null`.
    pub team_id: Option<i64>,
}

impl From<User> for UserResponse {
    fn from(value: User) -> Self {
        Self {
            id: value.id().value(),
            name: value.name().to_owned(),
            age: value.age(),
            org: value.org().to_owned(),
            salary: value.salary(),
            team_id: value.team_id().map(|id| id.value()),
        }
    }
}

fn map_user_validation_error(err: UserValidationError) -> Error {
    match err {
        UserValidationError::NegativeSalary => {
            Error::invalid_request("salary must not be negative").with_details(json!({
                "field": "salary",
                "code": "negative_salary",
            }))
        }
    }
}

/// List every stored user.
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Users", body = [UserResponse]),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(state: web::Data<HttpState>) -> ApiResult<web::Json<Vec<UserResponse>>> {
    let users = state.membership.list_users().await?;
    Ok(web::Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Fetch a single user.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 400, description = "Malformed id", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserResponse>> {
    let id = parse_user_id(&path.into_inner(), "id")?;
    let user = state.membership.get_user(id).await?;
    Ok(web::Json(user.into()))
}

/// Create a user. The stored record is always a free agent.
#[utoipa::path(
    post,
    path = "/users",
    request_body = UserProfileRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    payload: web::Json<UserProfileRequest>,
) -> ApiResult<HttpResponse> {
    let draft = UserDraft::try_from(payload.into_inner()).map_err(map_user_validation_error)?;
    let user = state.membership.create_user(&draft).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Replace a user's profile. Assignment is preserved and an assigned
/// user's salary cannot change here.
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User identifier")),
    request_body = UserProfileRequest,
    responses(
        (status = 200, description = "User replaced", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "replaceUser"
)]
#[put("/users/{id}")]
pub async fn replace_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UserProfileRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let id = parse_user_id(&path.into_inner(), "id")?;
    let draft = UserDraft::try_from(payload.into_inner()).map_err(map_user_validation_error)?;
    let user = state.membership.replace_user(id, &draft).await?;
    Ok(web::Json(user.into()))
}

/// Partially update a user.
#[utoipa::path(
    patch,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User identifier")),
    request_body = UserPatchRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "patchUser"
)]
#[patch("/users/{id}")]
pub async fn patch_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<UserPatchRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let id = parse_user_id(&path.into_inner(), "id")?;
    let patch = UserPatch::try_from(payload.into_inner()).map_err(map_user_validation_error)?;
    let user = state.membership.patch_user(id, &patch).await?;
    Ok(web::Json(user.into()))
}

/// Delete a user, releasing any held budget.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User identifier")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Malformed id", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(&path.into_inner(), "id")?;
    state.membership.delete_user(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test as actix_test, web};
    use serde_json::{Value, json};

    use super::*;
    use crate::test_support::{InMemoryRoster, membership_service};

    fn state(roster: &InMemoryRoster) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(Arc::new(membership_service(roster))))
    }

    macro_rules! users_app {
        ($roster:expr) => {
            actix_test::init_service(
                App::new()
                    .app_data(state($roster))
                    .service(list_users)
                    .service(get_user)
                    .service(create_user)
                    .service(replace_user)
                    .service(patch_user)
                    .service(delete_user),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn create_returns_201_and_a_free_agent() {
        let roster = InMemoryRoster::default();
        let app = users_app!(&roster);

        let request = actix_test::TestRequest::post()
            .uri("/users")
            .set_json(json!({ "name": "Ada", "age": 36, "org": "acme", "salary": 600 }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["name"], "Ada");
        assert_eq!(body["salary"], 600);
        assert_eq!(body["teamId"], Value::Null);
    }

    #[actix_web::test]
    async fn create_rejects_negative_salaries() {
        let roster = InMemoryRoster::default();
        let app = users_app!(&roster);

        let request = actix_test::TestRequest::post()
            .uri("/users")
            .set_json(json!({ "name": "Ada", "age": 36, "org": "acme", "salary": -5 }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["code"], "invalid_request");
        assert_eq!(body["details"]["code"], "negative_salary");
    }

    #[actix_web::test]
    async fn get_reports_missing_users_and_malformed_ids() {
        let roster = InMemoryRoster::default();
        let app = users_app!(&roster);

        let missing = actix_test::TestRequest::get().uri("/users/7").to_request();
        let response = actix_test::call_service(&app, missing).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let malformed = actix_test::TestRequest::get()
            .uri("/users/seven")
            .to_request();
        let response = actix_test::call_service(&app, malformed).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["details"]["code"], "invalid_id");
        assert_eq!(body["details"]["value"], "seven");
    }

    #[actix_web::test]
    async fn list_returns_created_users() {
        let roster = InMemoryRoster::default();
        let app = users_app!(&roster);

        for name in ["Ada", "Grace"] {
            let request = actix_test::TestRequest::post()
                .uri("/users")
                .set_json(json!({ "name": name, "age": 30, "org": "acme", "salary": 100 }))
                .to_request();
            let response = actix_test::call_service(&app, request).await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response =
            actix_test::call_service(&app, actix_test::TestRequest::get().uri("/users").to_request())
                .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        let listed = body.as_array().expect("array");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0]["name"], "Ada");
        assert!(listed[0].get("team_id").is_none(), "responses are camelCase");
    }

    #[actix_web::test]
    async fn replace_rewrites_the_profile() {
        let roster = InMemoryRoster::default();
        let app = users_app!(&roster);

        let request = actix_test::TestRequest::post()
            .uri("/users")
            .set_json(json!({ "name": "Ada", "age": 36, "org": "acme", "salary": 600 }))
            .to_request();
        let created: Value =
            actix_test::read_body_json(actix_test::call_service(&app, request).await).await;

        let request = actix_test::TestRequest::put()
            .uri(&format!("/users/{}", created["id"]))
            .set_json(json!({ "name": "Ada Lovelace", "age": 37, "org": "acme", "salary": 650 }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["name"], "Ada Lovelace");
        assert_eq!(body["salary"], 650);
        assert_eq!(body["id"], created["id"]);
    }

    #[actix_web::test]
    async fn patch_applies_only_the_sent_fields() {
        let roster = InMemoryRoster::default();
        let app = users_app!(&roster);

        let request = actix_test::TestRequest::post()
            .uri("/users")
            .set_json(json!({ "name": "Ada", "age": 36, "org": "acme", "salary": 600 }))
            .to_request();
        let created: Value =
            actix_test::read_body_json(actix_test::call_service(&app, request).await).await;

        let request = actix_test::TestRequest::patch()
            .uri(&format!("/users/{}", created["id"]))
            .set_json(json!({ "org": "initech" }))
            .to_request();
        let response = actix_test::call_service(&app, request).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["org"], "initech");
        assert_eq!(body["name"], "Ada");
        assert_eq!(body["salary"], 600);
    }

    #[actix_web::test]
    async fn delete_returns_204_then_404() {
        let roster = InMemoryRoster::default();
        let app = users_app!(&roster);

        let request = actix_test::TestRequest::post()
            .uri("/users")
            .set_json(json!({ "name": "Ada", "age": 36, "org": "acme", "salary": 600 }))
            .to_request();
        let created: Value =
            actix_test::read_body_json(actix_test::call_service(&app, request).await).await;
        let uri = format!("/users/{}", created["id"]);

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete().uri(&uri).to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete().uri(&uri).to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
