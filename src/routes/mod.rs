pub mod generate;
pub mod health;

use actix_web::web;

/// Registers every route; shared by `main` and the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(generate::json_config())
        .route("/", web::get().to(health::liveness))
        .route("/health", web::get().to(health::health_check))
        .route("/generate", web::post().to(generate::generate))
        .route("/api/trip", web::post().to(generate::generate));
}
