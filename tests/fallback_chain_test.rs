mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio_test::assert_ok;

use common::{two_day_itinerary, Reply, StubBackend};
use voyager_api::config::GenerationOptions;
use voyager_api::services::generation_service::{
    CandidateFailure, GenerationChain, GenerationError,
};
use voyager_api::services::providers::ProviderError;
use voyager_api::services::response_normalizer::normalize;

fn chain(backend: Arc<StubBackend>, models: &[&str], timeout: Duration) -> GenerationChain {
    GenerationChain::new(
        backend,
        models.iter().map(|m| m.to_string()).collect(),
        timeout,
    )
}

#[tokio::test(start_paused = true)]
async fn stops_at_first_parseable_candidate() {
    let backend = Arc::new(
        StubBackend::new()
            .reply("slow", Reply::Hang)
            .reply(
                "limited",
                Reply::Fail(ProviderError::Rejected { status: 429, body: "quota".into() }),
            )
            .reply("chatty", Reply::Text("Here is your itinerary!".into()))
            .reply("good", Reply::Text(format!("```json\n{}\n```", two_day_itinerary())))
            .reply("never", Reply::Text(two_day_itinerary())),
    );
    let chain = chain(
        backend.clone(),
        &["slow", "limited", "chatty", "good", "never"],
        Duration::from_secs(20),
    );

    let itinerary = assert_ok!(chain.generate("plan", &GenerationOptions::default()).await);

    assert_eq!(itinerary, normalize(&two_day_itinerary()).unwrap());
    assert_eq!(backend.calls(), vec!["slow", "limited", "chatty", "good"]);
}

#[tokio::test(start_paused = true)]
async fn hung_candidate_costs_exactly_its_timeout() {
    let backend = Arc::new(
        StubBackend::new()
            .reply("slow", Reply::Hang)
            .reply("good", Reply::Text(two_day_itinerary())),
    );
    let chain = chain(backend, &["slow", "good"], Duration::from_secs(20));

    let started = tokio::time::Instant::now();
    assert_ok!(chain.generate("plan", &GenerationOptions::default()).await);
    assert_eq!(started.elapsed(), Duration::from_secs(20));
}

#[tokio::test]
async fn exhaustion_reports_last_failure() {
    let backend = Arc::new(
        StubBackend::new()
            .reply("a", Reply::Fail(ProviderError::Transport("connection reset".into())))
            .reply("b", Reply::Text("{\"trip_name\": \"no days\"}".into())),
    );
    let chain = chain(backend.clone(), &["a", "b"], Duration::from_secs(5));

    let err = chain
        .generate("plan", &GenerationOptions::default())
        .await
        .unwrap_err();

    match err {
        GenerationError::Exhausted { attempts, model, reason } => {
            assert_eq!(attempts, 2);
            assert_eq!(model, "b");
            assert!(matches!(reason, CandidateFailure::Unparseable(_)));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(backend.calls(), vec!["a", "b"]);
}

#[tokio::test(start_paused = true)]
async fn timeout_is_classified_as_provider_failure() {
    let backend = Arc::new(StubBackend::new().reply("slow", Reply::Hang));
    let chain = chain(backend, &["slow"], Duration::from_secs(3));

    let err = chain
        .generate("plan", &GenerationOptions::default())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GenerationError::Exhausted {
            attempts: 1,
            model: "slow".to_string(),
            reason: CandidateFailure::Provider(ProviderError::Timeout(Duration::from_secs(3))),
        }
    );
}

#[tokio::test]
async fn failing_candidate_is_not_retried() {
    let backend = Arc::new(
        StubBackend::new()
            .reply("a", Reply::Text("not json".into()))
            .reply("b", Reply::Text(two_day_itinerary())),
    );
    let chain = chain(backend.clone(), &["a", "b"], Duration::from_secs(5));

    assert_ok!(chain.generate("plan", &GenerationOptions::default()).await);
    assert_eq!(backend.calls(), vec!["a", "b"]);
}

#[tokio::test]
async fn empty_chain_fails_without_calls() {
    let backend = Arc::new(StubBackend::new());
    let chain = chain(backend.clone(), &[], Duration::from_secs(5));

    let err = chain
        .generate("plan", &GenerationOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err, GenerationError::NoCandidates);
    assert!(backend.calls().is_empty());
}
