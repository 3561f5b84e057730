use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{error, info};

use voyager_api::config::AppConfig;
use voyager_api::middleware::cors::CorsMiddleware;
use voyager_api::routes;
use voyager_api::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Model chain: {} (timeout {:?} each); enrichment: {} worker(s), budget {:?}",
        config.generation.models.join(" -> "),
        config.generation.timeout,
        config.enrichment.concurrency,
        config.enrichment.budget
    );
    info!(
        "Worst-case /generate latency is {:?}; keep upstream timeouts above it",
        config.worst_case_latency()
    );

    let host = config.host.clone();
    let port = config.port;
    let origins = config.allowed_origins.clone();

    let state = match AppState::from_config(config) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(CorsMiddleware::new(origins.clone()))
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(routes::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
