#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::{web, App};
use async_trait::async_trait;
use serde_json::json;

use voyager_api::config::{
    AppConfig, CorsOrigins, EnrichmentConfig, GenerationConfig, GenerationOptions,
};
use voyager_api::middleware::cors::CorsMiddleware;
use voyager_api::models::itinerary::Coords;
use voyager_api::routes;
use voyager_api::services::providers::{GenerativeBackend, Geocoder, ImageSearch, ProviderError};
use voyager_api::state::AppState;

pub const PLACEHOLDER_BASE: &str = "https://placeholder.test/800/600";

/// Scripted reply for one model.
#[derive(Clone)]
pub enum Reply {
    Text(String),
    Fail(ProviderError),
    /// Never answers; only useful with a paused clock.
    Hang,
}

#[derive(Default)]
pub struct StubBackend {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<String>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, model: &str, reply: Reply) -> Self {
        self.replies.insert(model.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeBackend for StubBackend {
    async fn generate(
        &self,
        model: &str,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(model.to_string());
        match self.replies.get(model).cloned() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Hang) => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
            None => Err(ProviderError::Rejected {
                status: 404,
                body: format!("unknown model {}", model),
            }),
        }
    }
}

/// Image search answering every query the same way, optionally after a delay.
pub struct StubImages {
    answer: Result<Option<String>, ProviderError>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubImages {
    pub fn found(url: &str) -> Self {
        Self::answering(Ok(Some(url.to_string())))
    }

    pub fn answering(answer: Result<Option<String>, ProviderError>) -> Self {
        Self {
            answer,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageSearch for StubImages {
    async fn thumbnail(&self, query: &str) -> Result<Option<String>, ProviderError> {
        self.calls.lock().unwrap().push(query.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

/// Geocoder with a fixed answer table; unknown queries resolve to nothing.
#[derive(Default)]
pub struct StubGeocoder {
    answers: HashMap<String, Result<Option<Coords>, ProviderError>>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
}

impl StubGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, query: &str, coords: Coords) -> Self {
        self.answers.insert(query.to_string(), Ok(Some(coords)));
        self
    }

    pub fn fail(mut self, query: &str, err: ProviderError) -> Self {
        self.answers.insert(query.to_string(), Err(err));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coords>, ProviderError> {
        self.calls.lock().unwrap().push(query.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.answers.get(query).cloned().unwrap_or(Ok(None))
    }
}

pub fn enrichment_config() -> EnrichmentConfig {
    EnrichmentConfig {
        placeholder_base_url: PLACEHOLDER_BASE.to_string(),
        image_timeout: Duration::from_secs(2),
        geocode_timeout: Duration::from_secs(2),
        concurrency: 3,
        budget: Duration::from_secs(10),
        ..EnrichmentConfig::default()
    }
}

pub fn test_config(models: &[&str]) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        generation: GenerationConfig {
            api_base: "http://generation.invalid".to_string(),
            api_key: "test-key".to_string(),
            models: models.iter().map(|m| m.to_string()).collect(),
            timeout: Duration::from_secs(5),
            options: GenerationOptions::default(),
        },
        enrichment: enrichment_config(),
        allowed_origins: CorsOrigins::Any,
    }
}

/// Two days with one activity each, in the shape the prompt asks for.
pub fn two_day_itinerary() -> String {
    json!({
        "trip_name": "Kurnool in Three Days",
        "total_budget": "15000",
        "itinerary": [
            { "day": 1, "activities": [{
                "id": "d1a1", "time": "09:00 AM", "place": "Konda Reddy Fort (Main Gate)",
                "description": "Morning walk around the fort", "cost": 50, "duration": 90,
                "priority": "high", "energy": "medium", "coords": [0.0, 0.0]
            }]},
            { "day": 2, "activities": [{
                "id": "d2a1", "time": "10:00 AM", "place": "Belum Caves",
                "description": "Guided cave tour", "cost": 200, "duration": 120,
                "priority": "medium", "energy": "high"
            }]}
        ]
    })
    .to_string()
}

pub struct TestApp {
    pub state: web::Data<AppState>,
    pub origins: CorsOrigins,
}

impl TestApp {
    pub fn new(
        config: AppConfig,
        backend: Arc<StubBackend>,
        images: Arc<StubImages>,
        geocoder: Arc<StubGeocoder>,
    ) -> Self {
        let origins = config.allowed_origins.clone();
        let state = AppState::with_providers(config, backend, images, geocoder);
        Self {
            state: web::Data::new(state),
            origins,
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .wrap(CorsMiddleware::new(self.origins.clone()))
            .app_data(self.state.clone())
            .configure(routes::configure)
    }
}
