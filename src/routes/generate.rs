use actix_web::{web, HttpResponse};
use log::{error, warn};

use crate::error::ApiError;
use crate::models::trip_request::TripRequest;
use crate::state::AppState;

/*
    POST /generate
    POST /api/trip
*/
pub async fn generate(
    state: web::Data<AppState>,
    input: web::Json<TripRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = input.into_inner();
    request.validate().map_err(ApiError::InvalidRequest)?;

    match state.planner.plan(&request).await {
        Ok((itinerary, report)) => {
            if report.abandoned > 0 {
                warn!(
                    "Returning itinerary for {} with {} of {} activities unenriched",
                    request.location, report.abandoned, report.total
                );
            }
            Ok(HttpResponse::Ok().json(itinerary))
        }
        Err(err) => {
            error!("Generation failed for {}: {}", request.location, err);
            Err(err.into())
        }
    }
}

/// Routes JSON body errors through `ApiError` so they share the `{"error": ..}` shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        warn!("Rejected request body: {}", err);
        ApiError::InvalidRequest(err.to_string()).into()
    })
}
