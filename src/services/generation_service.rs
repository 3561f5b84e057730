use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use thiserror::Error;

use crate::config::{GenerationConfig, GenerationOptions};
use crate::models::itinerary::Itinerary;
use crate::services::providers::{with_timeout, GenerativeBackend, ProviderError};
use crate::services::response_normalizer::{normalize, ParseError};

/// Why a single candidate was skipped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CandidateFailure {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("unusable itinerary: {0}")]
    Unparseable(String),
}

impl From<ParseError> for CandidateFailure {
    fn from(err: ParseError) -> Self {
        CandidateFailure::Unparseable(err.to_string())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GenerationError {
    /// Only the last failure is kept; it is a diagnostic, not necessarily the root cause.
    #[error("all {attempts} generation candidates failed; last was {model}: {reason}")]
    Exhausted {
        attempts: usize,
        model: String,
        reason: CandidateFailure,
    },

    #[error("no generation candidates configured")]
    NoCandidates,
}

/// Tries each model in order until one returns a parseable itinerary.
///
/// Candidates are never run concurrently; the worst case is the sum of every
/// per-candidate timeout.
#[derive(Clone)]
pub struct GenerationChain {
    backend: Arc<dyn GenerativeBackend>,
    candidates: Vec<String>,
    per_call_timeout: Duration,
}

impl GenerationChain {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        candidates: Vec<String>,
        per_call_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            candidates,
            per_call_timeout,
        }
    }

    pub fn from_config(backend: Arc<dyn GenerativeBackend>, config: &GenerationConfig) -> Self {
        Self::new(backend, config.models.clone(), config.timeout)
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Itinerary, GenerationError> {
        let mut last_failure: Option<(String, CandidateFailure)> = None;

        for (attempt, model) in self.candidates.iter().enumerate() {
            info!(
                "Generation attempt {}/{} with model {}",
                attempt + 1,
                self.candidates.len(),
                model
            );

            match self.try_candidate(model, prompt, options).await {
                Ok(itinerary) => {
                    info!(
                        "Model {} produced an itinerary with {} day(s)",
                        model,
                        itinerary.itinerary.len()
                    );
                    return Ok(itinerary);
                }
                Err(failure) => {
                    match &failure {
                        CandidateFailure::Provider(err) if err.is_rate_limited() => {
                            warn!("Model {} is rate limited, moving on", model)
                        }
                        other => warn!("Model {} failed: {}", model, other),
                    }
                    last_failure = Some((model.clone(), failure));
                }
            }
        }

        match last_failure {
            Some((model, reason)) => Err(GenerationError::Exhausted {
                attempts: self.candidates.len(),
                model,
                reason,
            }),
            None => Err(GenerationError::NoCandidates),
        }
    }

    async fn try_candidate(
        &self,
        model: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Itinerary, CandidateFailure> {
        let raw = with_timeout(
            self.per_call_timeout,
            self.backend.generate(model, prompt, options),
        )
        .await?;

        Ok(normalize(&raw)?)
    }
}
