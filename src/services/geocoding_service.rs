//! ArcGIS World Geocoding Service lookups.
//!
//! Uses the keyless `findAddressCandidates` endpoint and keeps only the best
//! match. The service reports longitude as `x` and latitude as `y`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::models::itinerary::Coords;
use crate::services::providers::{Geocoder, ProviderError};

#[derive(Debug, Deserialize)]
struct FindCandidatesResponse {
    #[serde(default)]
    candidates: Vec<AddressCandidate>,
    error: Option<ArcGisError>,
}

#[derive(Debug, Deserialize)]
struct AddressCandidate {
    location: CandidateLocation,
}

#[derive(Debug, Deserialize)]
struct CandidateLocation {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct ArcGisError {
    code: Option<i64>,
    message: Option<String>,
}

#[derive(Clone)]
pub struct ArcGisGeocoder {
    client: Client,
    endpoint: String,
}

impl ArcGisGeocoder {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Geocoder for ArcGisGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coords>, ProviderError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("SingleLine", query),
                ("maxLocations", "1"),
                ("outFields", "none"),
                ("f", "json"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: FindCandidatesResponse = response.json().await?;
        best_match(body)
    }
}

// ArcGIS reports some failures inside a 200 body
fn best_match(body: FindCandidatesResponse) -> Result<Option<Coords>, ProviderError> {
    if let Some(error) = body.error {
        return Err(ProviderError::Rejected {
            status: error.code.unwrap_or(0).clamp(0, u16::MAX as i64) as u16,
            body: error.message.unwrap_or_default(),
        });
    }

    Ok(body
        .candidates
        .into_iter()
        .next()
        .map(|c| Coords::new(c.location.y, c.location.x))
        .filter(|coords| coords.lat.is_finite() && coords.lon.is_finite() && !coords.is_unknown()))
}
