pub mod enrichment_coordinator;
pub mod enrichment_service;
pub mod gemini_service;
pub mod generation_service;
pub mod geocoding_service;
pub mod image_service;
pub mod providers;
pub mod response_normalizer;
pub mod trip_planner;
