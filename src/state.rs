use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::config::AppConfig;
use crate::services::enrichment_coordinator::EnrichmentCoordinator;
use crate::services::enrichment_service::ActivityEnricher;
use crate::services::gemini_service::GeminiBackend;
use crate::services::generation_service::GenerationChain;
use crate::services::geocoding_service::ArcGisGeocoder;
use crate::services::image_service::WikipediaImageSearch;
use crate::services::providers::{GenerativeBackend, Geocoder, ImageSearch};
use crate::services::trip_planner::TripPlanner;

const USER_AGENT: &str = concat!("voyager-api/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Shared per-process state handed to handlers through `web::Data`.
pub struct AppState {
    pub config: AppConfig,
    pub planner: TripPlanner,
}

impl AppState {
    /// Wires the real HTTP-backed providers.
    pub fn from_config(config: AppConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;

        let backend = Arc::new(GeminiBackend::new(client.clone(), &config.generation));
        let images = Arc::new(WikipediaImageSearch::new(
            client.clone(),
            config.enrichment.image_search_url.clone(),
        ));
        let geocoder = Arc::new(ArcGisGeocoder::new(
            client,
            config.enrichment.geocoder_url.clone(),
        ));

        Ok(Self::with_providers(config, backend, images, geocoder))
    }

    pub fn with_providers(
        config: AppConfig,
        backend: Arc<dyn GenerativeBackend>,
        images: Arc<dyn ImageSearch>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        let chain = GenerationChain::from_config(backend, &config.generation);
        let enricher = Arc::new(ActivityEnricher::from_config(
            images,
            geocoder,
            &config.enrichment,
        ));
        let coordinator = EnrichmentCoordinator::from_config(enricher, &config.enrichment);
        let planner = TripPlanner::new(chain, coordinator, config.generation.options.clone());

        Self { config, planner }
    }
}
