//! HTTP inbound adapter exposing the REST endpoints.

pub mod admin;
pub mod error;
pub mod health;
pub mod state;
pub mod teams;
pub mod users;
pub mod validation;

pub use error::ApiResult;

use actix_web::web;

/// Register every route on the application.
///
/// # Examples
/// ```
/// use actix_web::App;
///
/// let app = App::new().configure(rosterd::inbound::http::configure_routes);
/// ```
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(users::list_users)
        .service(users::get_user)
        .service(users::create_user)
        .service(users::replace_user)
        .service(users::patch_user)
        .service(users::delete_user)
        .service(teams::create_team)
        .service(teams::list_teams)
        .service(teams::join_team)
        .service(teams::leave_team)
        .service(teams::delete_team)
        .service(health::live)
        .service(health::ready);
}
