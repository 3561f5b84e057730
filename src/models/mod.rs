pub mod itinerary;
pub mod trip_request;
