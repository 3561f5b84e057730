use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::config::EnrichmentConfig;
use crate::models::itinerary::{Activity, Coords};
use crate::services::image_service::PlaceholderImages;
use crate::services::providers::{with_timeout, Geocoder, ImageSearch};

/// The place name before its first parenthetical qualifier, trimmed.
///
/// `"Taj Mahal (East Gate)"` gives `"Taj Mahal"`. Returns `None` when nothing searchable is left.
pub fn clean_query(place: &str) -> Option<&str> {
    let head = match place.find('(') {
        Some(idx) => &place[..idx],
        None => place,
    };
    let head = head.trim();
    (!head.is_empty()).then_some(head)
}

/// Annotates one activity with an image and coordinates.
///
/// The two lookups are independent and each has its own timeout. Failures
/// never propagate: the image falls back to a placeholder and coords to the
/// sentinel.
#[derive(Clone)]
pub struct ActivityEnricher {
    images: Arc<dyn ImageSearch>,
    geocoder: Arc<dyn Geocoder>,
    placeholders: PlaceholderImages,
    image_timeout: Duration,
    geocode_timeout: Duration,
}

impl ActivityEnricher {
    pub fn new(
        images: Arc<dyn ImageSearch>,
        geocoder: Arc<dyn Geocoder>,
        placeholders: PlaceholderImages,
        image_timeout: Duration,
        geocode_timeout: Duration,
    ) -> Self {
        Self {
            images,
            geocoder,
            placeholders,
            image_timeout,
            geocode_timeout,
        }
    }

    pub fn from_config(
        images: Arc<dyn ImageSearch>,
        geocoder: Arc<dyn Geocoder>,
        config: &EnrichmentConfig,
    ) -> Self {
        Self::new(
            images,
            geocoder,
            PlaceholderImages::new(config.placeholder_base_url.clone()),
            config.image_timeout,
            config.geocode_timeout,
        )
    }

    pub async fn enrich(&self, mut activity: Activity, location_context: &str) -> Activity {
        let Some(query) = activity.place.as_deref().and_then(clean_query).map(str::to_string) else {
            return activity;
        };

        let needs_coords = activity.coords.is_unknown();
        let (image, coords) = tokio::join!(
            self.lookup_image(&query),
            async {
                if needs_coords {
                    Some(self.lookup_coords(&query, location_context).await)
                } else {
                    None
                }
            }
        );

        activity.image = Some(image);
        if let Some(coords) = coords {
            activity.coords = coords;
        }
        activity
    }

    /// Placeholder-only annotation for activities whose lookups never finished.
    pub fn apply_fallbacks(&self, activity: &mut Activity) {
        if activity.image.is_none() {
            if let Some(query) = activity.place.as_deref().and_then(clean_query) {
                activity.image = Some(self.placeholders.url_for(query));
            }
        }
    }

    async fn lookup_image(&self, query: &str) -> String {
        match with_timeout(self.image_timeout, self.images.thumbnail(query)).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                debug!("No thumbnail for '{}', using placeholder", query);
                self.placeholders.url_for(query)
            }
            Err(e) => {
                debug!("Image lookup for '{}' failed: {}", query, e);
                self.placeholders.url_for(query)
            }
        }
    }

    // One attempt with the trip location as context, then one without
    async fn lookup_coords(&self, query: &str, location_context: &str) -> Coords {
        let context = location_context.trim();
        if !context.is_empty() {
            let contextual = format!("{}, {}", query, context);
            if let Some(coords) = self.geocode(&contextual).await {
                return coords;
            }
        }

        self.geocode(query).await.unwrap_or(Coords::UNKNOWN)
    }

    async fn geocode(&self, query: &str) -> Option<Coords> {
        match with_timeout(self.geocode_timeout, self.geocoder.geocode(query)).await {
            Ok(found) => found.filter(|c| !c.is_unknown()),
            Err(e) => {
                debug!("Geocoding '{}' failed: {}", query, e);
                None
            }
        }
    }
}
