use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::state::AppState;

pub const LIVENESS_TEXT: &str = "VOYAGER AI ENGINE IS RUNNING";

#[derive(Serialize)]
struct HealthStatus<'a> {
    status: &'static str,
    version: &'static str,
    models: &'a [String],
    generation_timeout_secs: u64,
    enrichment: EnrichmentStatus,
    worst_case_latency_secs: u64,
}

#[derive(Serialize)]
struct EnrichmentStatus {
    concurrency: usize,
    budget_secs: u64,
    image_timeout_ms: u128,
    geocode_timeout_ms: u128,
}

pub async fn liveness() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain; charset=utf-8").body(LIVENESS_TEXT)
}

/// Reports configuration only; it never calls the external providers.
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let config = &state.config;
    let health = HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        models: state.planner.chain().candidates(),
        generation_timeout_secs: config.generation.timeout.as_secs(),
        enrichment: EnrichmentStatus {
            concurrency: config.enrichment.concurrency,
            budget_secs: config.enrichment.budget.as_secs(),
            image_timeout_ms: config.enrichment.image_timeout.as_millis(),
            geocode_timeout_ms: config.enrichment.geocode_timeout.as_millis(),
        },
        worst_case_latency_secs: config.worst_case_latency().as_secs(),
    };

    HttpResponse::Ok().json(health)
}
