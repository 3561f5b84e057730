//! Prompt construction and defensive parsing of model output.
//!
//! Model text is untrusted: it may be wrapped in Markdown fences, carry stray
//! whitespace, or not be JSON at all. Every failure here is a `ParseError`,
//! which the generation chain treats as "try the next model".

use serde_json::Value;
use thiserror::Error;

use crate::models::itinerary::Itinerary;
use crate::models::trip_request::TripRequest;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("response was empty")]
    Empty,

    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("response JSON is not an object")]
    NotAnObject,

    #[error("response has no itinerary list")]
    MissingItinerary,

    #[error("itinerary has an unexpected shape: {0}")]
    Shape(String),
}

/// Renders the generation prompt for a trip request.
pub fn build_prompt(request: &TripRequest) -> String {
    let vibe = if request.vibe.is_empty() {
        "a balanced mix of sightseeing, food and rest".to_string()
    } else {
        request.vibe.join(", ")
    };

    format!(
        r#"You are a local travel expert. Plan a {days}-day trip to {location} for {people} traveller(s).
Preferences: {vibe}.
Budget tier: {tier} ({hint}). Total budget for the group: {total_budget}.

Use real, specific, geocodable place names in "place" (no generic labels like "local market").
Give "cost" as a plain number per person in local currency and "duration" in minutes.
"priority" and "energy" must each be one of "high", "medium" or "low".
Produce exactly {days} day entries, numbered from 1.

Return ONLY a JSON object, no prose and no Markdown, with this shape:
{{
  "trip_name": "string",
  "total_budget": "string",
  "itinerary": [
    {{
      "day": 1,
      "activities": [
        {{
          "id": "d1a1",
          "time": "09:00 AM",
          "place": "string",
          "description": "string",
          "cost": 0,
          "duration": 60,
          "priority": "high",
          "energy": "medium",
          "coords": [0.0, 0.0]
        }}
      ]
    }}
  ]
}}"#,
        days = request.days,
        location = request.location.trim(),
        people = request.people,
        vibe = vibe,
        tier = request.budget_tier,
        hint = request.budget_tier.spending_hint(),
        total_budget = request.total_budget,
    )
}

/// Removes surrounding whitespace, Markdown code fences and a `json` language tag.
///
/// Each piece is stripped on its own: models sometimes emit only the closing
/// fence, or only the bare tag.
pub fn strip_decoration(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the language tag, if any, up to the end of the opening fence line
        text = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }

    text = text.trim();
    if let Some(body) = text.strip_suffix("```") {
        text = body.trim_end();
    }

    // JSON never starts with a letter, so a leading tag is always decoration
    if let Some(tag) = text.get(..4) {
        if tag.eq_ignore_ascii_case("json") {
            text = &text[4..];
        }
    }

    text.trim()
}

pub fn normalize(raw: &str) -> Result<Itinerary, ParseError> {
    let text = strip_decoration(raw);
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let value: Value =
        serde_json::from_str(text).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let object = value.as_object().ok_or(ParseError::NotAnObject)?;
    match object.get("itinerary") {
        Some(Value::Array(_)) => {}
        _ => return Err(ParseError::MissingItinerary),
    }

    serde_json::from_value(value).map_err(|e| ParseError::Shape(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::itinerary::Coords;
    use crate::models::trip_request::BudgetTier;

    const BODY: &str = r#"{
        "trip_name": "Kurnool Explorer",
        "total_budget": 15000,
        "itinerary": [
            { "day": 1, "activities": [
                { "id": "a1", "time": "09:00", "place": "Konda Reddy Fort",
                  "cost": 50, "duration": 90, "priority": "high", "energy": "low",
                  "coords": [15.83, 78.05] }
            ]}
        ]
    }"#;

    #[test]
    fn strips_fences_with_language_tag() {
        let fenced = format!("```json\n{}\n```\n", BODY);
        assert_eq!(strip_decoration(&fenced), BODY.trim());

        let bare_fence = format!("```\n{}```", BODY);
        assert_eq!(strip_decoration(&bare_fence), BODY.trim());

        assert_eq!(strip_decoration("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn strips_single_line_fence() {
        assert_eq!(strip_decoration("```json{\"itinerary\":[]}```"), "{\"itinerary\":[]}");
    }

    #[test]
    fn strips_lone_closing_fence_and_bare_tag() {
        assert_eq!(strip_decoration("{\"itinerary\": []}\n```"), "{\"itinerary\": []}");
        assert_eq!(strip_decoration("json\n{\"itinerary\": []}"), "{\"itinerary\": []}");
        assert_eq!(strip_decoration("JSON {\"itinerary\": []}"), "{\"itinerary\": []}");

        assert!(normalize("{\"itinerary\": []}\n```").is_ok());
        assert!(normalize("json\n{\"itinerary\": []}").is_ok());
        assert!(normalize(&format!("json\n{}\n```", BODY)).is_ok());
    }

    #[test]
    fn normalizes_fenced_itinerary() {
        let itinerary = normalize(&format!("```json\n{}\n```", BODY)).unwrap();
        assert_eq!(itinerary.trip_name, "Kurnool Explorer");
        assert_eq!(itinerary.total_budget, "15000");
        let activity = &itinerary.itinerary[0].activities[0];
        assert_eq!(activity.place.as_deref(), Some("Konda Reddy Fort"));
        assert_eq!(activity.coords, Coords::new(15.83, 78.05));
        assert!(activity.image.is_none());
    }

    #[test]
    fn classifies_structural_failures() {
        assert_eq!(normalize("   "), Err(ParseError::Empty));
        assert!(matches!(normalize("Sure! Here is your trip"), Err(ParseError::InvalidJson(_))));
        assert_eq!(normalize("[1, 2]"), Err(ParseError::NotAnObject));
        assert_eq!(normalize(r#"{"trip_name": "x"}"#), Err(ParseError::MissingItinerary));
        assert_eq!(normalize(r#"{"itinerary": {"day": 1}}"#), Err(ParseError::MissingItinerary));
        assert!(matches!(
            normalize(r#"{"itinerary": [{"day": 1, "activities": "none"}]}"#),
            Err(ParseError::Shape(_))
        ));
    }

    #[test]
    fn prompt_mentions_every_request_field() {
        let mut request = TripRequest::new("Kurnool", 3);
        request.people = 2;
        request.vibe = vec!["Eat".to_string(), "Relax".to_string()];
        request.budget_tier = BudgetTier::Luxury;
        request.total_budget = "15000".to_string();

        let prompt = build_prompt(&request);
        assert!(prompt.contains("3-day trip to Kurnool"));
        assert!(prompt.contains("2 traveller(s)"));
        assert!(prompt.contains("Eat, Relax"));
        assert!(prompt.contains("Luxury"));
        assert!(prompt.contains("15000"));
        assert!(prompt.contains("\"itinerary\": ["));
    }
}
