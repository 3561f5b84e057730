use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::config::EnrichmentConfig;
use crate::models::itinerary::Itinerary;
use crate::services::enrichment_service::ActivityEnricher;

/// Outcome of one enrichment pass. Never an error: partial results are normal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub total: usize,
    pub completed: usize,
    /// Tasks cancelled when the budget ran out, or that panicked.
    pub abandoned: usize,
}

/// Fans the enricher out over every activity of an itinerary.
///
/// Each task works on its own copy of an activity; only finished copies are
/// written back, and tasks still running at the deadline are aborted, so
/// nothing touches the itinerary after `enrich_all` returns.
#[derive(Clone)]
pub struct EnrichmentCoordinator {
    enricher: Arc<ActivityEnricher>,
    concurrency: usize,
    budget: Duration,
}

impl EnrichmentCoordinator {
    pub fn new(enricher: Arc<ActivityEnricher>, concurrency: usize, budget: Duration) -> Self {
        Self {
            enricher,
            concurrency: concurrency.max(1),
            budget,
        }
    }

    pub fn from_config(enricher: Arc<ActivityEnricher>, config: &EnrichmentConfig) -> Self {
        Self::new(enricher, config.concurrency, config.budget)
    }

    pub async fn enrich_all(
        &self,
        itinerary: &mut Itinerary,
        location_context: &str,
    ) -> EnrichmentReport {
        let positions: Vec<(usize, usize)> = itinerary
            .itinerary
            .iter()
            .enumerate()
            .flat_map(|(d, day)| (0..day.activities.len()).map(move |a| (d, a)))
            .collect();

        let mut report = EnrichmentReport {
            total: itinerary.activity_count(),
            ..Default::default()
        };
        if positions.is_empty() {
            return report;
        }

        let started = Instant::now();
        let deadline = started + self.budget;
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let context: Arc<str> = Arc::from(location_context);
        let mut tasks = JoinSet::new();

        for (slot, &(d, a)) in positions.iter().enumerate() {
            let activity = itinerary.itinerary[d].activities[a].clone();
            let enricher = self.enricher.clone();
            let permits = permits.clone();
            let context = context.clone();
            tasks.spawn(async move {
                // The semaphore is never closed while tasks are alive
                let _permit = permits.acquire_owned().await.ok();
                (slot, enricher.enrich(activity, &context).await)
            });
        }

        let mut finished = vec![false; positions.len()];
        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((slot, enriched)))) => {
                    let (d, a) = positions[slot];
                    itinerary.itinerary[d].activities[a] = enriched;
                    finished[slot] = true;
                    report.completed += 1;
                }
                Ok(Some(Err(e))) => warn!("Enrichment task failed: {}", e),
                Ok(None) => break,
                Err(_) => {
                    tasks.abort_all();
                    warn!(
                        "Enrichment budget of {:?} exhausted with {} task(s) still running",
                        self.budget,
                        tasks.len()
                    );
                    break;
                }
            }
        }

        for (slot, &(d, a)) in positions.iter().enumerate() {
            if !finished[slot] {
                self.enricher
                    .apply_fallbacks(&mut itinerary.itinerary[d].activities[a]);
            }
        }

        report.abandoned = report.total - report.completed;
        info!(
            "Enriched {}/{} activities in {:?} ({} abandoned)",
            report.completed,
            report.total,
            started.elapsed(),
            report.abandoned
        );
        report
    }
}
