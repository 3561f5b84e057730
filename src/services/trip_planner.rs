use log::info;

use crate::config::GenerationOptions;
use crate::models::itinerary::Itinerary;
use crate::models::trip_request::TripRequest;
use crate::services::enrichment_coordinator::{EnrichmentCoordinator, EnrichmentReport};
use crate::services::generation_service::{GenerationChain, GenerationError};
use crate::services::response_normalizer::build_prompt;

/// Request pipeline: prompt, generation fallback, then best-effort enrichment.
#[derive(Clone)]
pub struct TripPlanner {
    chain: GenerationChain,
    coordinator: EnrichmentCoordinator,
    options: GenerationOptions,
}

impl TripPlanner {
    pub fn new(
        chain: GenerationChain,
        coordinator: EnrichmentCoordinator,
        options: GenerationOptions,
    ) -> Self {
        Self {
            chain,
            coordinator,
            options,
        }
    }

    pub fn chain(&self) -> &GenerationChain {
        &self.chain
    }

    /// Only generation can fail; enrichment degrades silently.
    pub async fn plan(
        &self,
        request: &TripRequest,
    ) -> Result<(Itinerary, EnrichmentReport), GenerationError> {
        info!(
            "Planning {} day(s) in {} for {} traveller(s)",
            request.days, request.location, request.people
        );

        let prompt = build_prompt(request);
        let mut itinerary = self.chain.generate(&prompt, &self.options).await?;
        let report = self
            .coordinator
            .enrich_all(&mut itinerary, request.location_context())
            .await;

        Ok((itinerary, report))
    }
}
