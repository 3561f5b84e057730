//! Boundary contracts for the external collaborators.
//!
//! Every call returns an explicit `Result<_, ProviderError>` so callers decide
//! by matching on the outcome instead of swallowing panics or broad errors.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::GenerationOptions;
use crate::models::itinerary::Coords;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            ProviderError::Rejected { status, .. }
                if *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
        )
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// Bounds any provider call by `limit`, folding an elapsed deadline into `ProviderError::Timeout`.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(limit)),
    }
}

/// Generative-text API. Returns the raw candidate text, which is untrusted.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, ProviderError>;
}

/// Free-text geocoder returning the single best match, if any.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, query: &str) -> Result<Option<Coords>, ProviderError>;
}

/// Image search returning at most one thumbnail URL.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn thumbnail(&self, query: &str) -> Result<Option<String>, ProviderError>;
}
