//! HTTP server setup.

use std::sync::Arc;

use actix_web::{App, HttpServer, dev::Server, middleware::Logger, web};

use crate::api::{health, openapi::configure_swagger, route};
use crate::model::app_state::AppState;
use crate::model::config::ServerSettings;

/// Register every route under `context_path`, plus Swagger UI at the root.
pub fn configure_routes(cfg: &mut web::ServiceConfig, context_path: &str) {
    cfg.service(
        web::scope(context_path)
            .service(route::routes())
            .service(health::routes()),
    );
    configure_swagger(cfg);
}

/// Creates and binds the main HTTP server.
///
/// OS signals are left to the caller's shutdown handling; the returned
/// server stops when its handle is told to.
pub fn main_server(
    app_state: Arc<AppState>,
    settings: &ServerSettings,
) -> Result<Server, std::io::Error> {
    let context_path = settings.context_path.clone();

    Ok(HttpServer::new(move || {
        let context_path = context_path.clone();
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::from(app_state.clone()))
            .configure(move |cfg| configure_routes(cfg, &context_path))
    })
    .disable_signals()
    .shutdown_timeout(settings.shutdown_timeout_secs)
    .bind((settings.address.as_str(), settings.port))?
    .run())
}
