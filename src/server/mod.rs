//! Server construction and route wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use rosterd::ApiDoc;
use rosterd::domain::{Error, MembershipService};
use rosterd::inbound::http::admin::AdminGate;
use rosterd::inbound::http::configure_routes;
use rosterd::inbound::http::health::HealthState;
use rosterd::inbound::http::state::HttpState;
use rosterd::outbound::persistence::{
    DbPool, DieselMembershipStore, DieselTeamRepository, DieselUserRepository, PoolConfig,
};

fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    Error::invalid_request(format!("invalid JSON body: {err}")).into()
}

/// Build the dependency graph and run the server until shutdown.
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let pool = DbPool::new(PoolConfig::new(&config.database_url))
        .await
        .map_err(|err| std::io::Error::other(format!("database pool: {err}")))?;

    let membership = MembershipService::new(
        Arc::new(DieselUserRepository::new(pool.clone())),
        Arc::new(DieselTeamRepository::new(pool.clone())),
        Arc::new(DieselMembershipStore::new(pool)),
    );

    let state = web::Data::new(HttpState::new(Arc::new(membership)));
    let gate = web::Data::new(AdminGate::new(config.admin_key));
    let health = web::Data::new(HealthState::new());

    let server_state = state.clone();
    let server_gate = gate.clone();
    let server_health = health.clone();
    let server = HttpServer::new(move || {
        let app = App::new()
            .app_data(server_state.clone())
            .app_data(server_gate.clone())
            .app_data(server_health.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .configure(configure_routes);
        #[cfg(debug_assertions)]
        let app =
            app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
        app
    })
    .bind(config.bind_addr)?;

    health.mark_ready();
    server.run().await
}
