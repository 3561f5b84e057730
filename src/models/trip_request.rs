use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum BudgetTier {
    Budget,
    #[default]
    Medium,
    Luxury,
}

impl BudgetTier {
    /// How the prompt describes spending for this tier
    pub fn spending_hint(&self) -> &'static str {
        match self {
            BudgetTier::Budget => "keep costs low: street food, public transport, free sights",
            BudgetTier::Medium => "balance comfort and cost: mid-range dining and paid attractions",
            BudgetTier::Luxury => "premium experiences: fine dining, private tours, top venues",
        }
    }

    /// Reads the tier names used by the various front-ends; anything unknown is `Medium`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "budget" | "low budget" | "low" => BudgetTier::Budget,
            "luxury" => BudgetTier::Luxury,
            _ => BudgetTier::Medium,
        }
    }
}

impl<'de> Deserialize<'de> for BudgetTier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => BudgetTier::parse(&s),
            _ => BudgetTier::default(),
        })
    }
}

impl fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetTier::Budget => write!(f, "Budget"),
            BudgetTier::Medium => write!(f, "Medium"),
            BudgetTier::Luxury => write!(f, "Luxury"),
        }
    }
}

fn default_days() -> u32 {
    1
}

fn default_people() -> u32 {
    1
}

fn default_total_budget() -> String {
    "Flexible".to_string()
}

// Front-ends send counts as numbers or numeric strings; null means "not given"
fn deserialize_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_u64().map(|n| Some(n.min(u32::MAX as u64) as u32)).ok_or_else(
            || serde::de::Error::custom(format!("expected a positive integer, got {}", n)),
        ),
        Value::String(s) => s.trim().parse::<u32>().map(Some).map_err(|_| {
            serde::de::Error::custom(format!("expected a positive integer, got '{}'", s))
        }),
        other => Err(serde::de::Error::custom(format!(
            "expected a positive integer, got {}",
            other
        ))),
    }
}

fn deserialize_budget<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn deserialize_vibe<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let vibe: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(vibe
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect())
}

/// Request body as front-ends send it, before defaults and aliases are settled.
#[derive(Debug, Deserialize)]
struct TripRequestPayload {
    location: String,
    #[serde(default, deserialize_with = "deserialize_count")]
    days: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_count")]
    people: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_count")]
    travelers: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_vibe")]
    vibe: Vec<String>,
    #[serde(default)]
    budget_tier: BudgetTier,
    #[serde(default, deserialize_with = "deserialize_budget")]
    total_budget: Option<String>,
    #[serde(default, deserialize_with = "deserialize_budget")]
    budget: Option<String>,
}

impl From<TripRequestPayload> for TripRequest {
    fn from(payload: TripRequestPayload) -> Self {
        Self {
            location: payload.location,
            days: payload.days.unwrap_or_else(default_days),
            people: payload
                .people
                .or(payload.travelers)
                .unwrap_or_else(default_people),
            vibe: payload.vibe,
            budget_tier: payload.budget_tier,
            total_budget: payload
                .total_budget
                .or(payload.budget)
                .unwrap_or_else(default_total_budget),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(from = "TripRequestPayload")]
pub struct TripRequest {
    pub location: String,
    pub days: u32,
    pub people: u32,
    pub vibe: Vec<String>,
    pub budget_tier: BudgetTier,
    pub total_budget: String,
}

impl TripRequest {
    pub fn new(location: impl Into<String>, days: u32) -> Self {
        Self {
            location: location.into(),
            days,
            people: default_people(),
            vibe: Vec::new(),
            budget_tier: BudgetTier::default(),
            total_budget: default_total_budget(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.location.trim().is_empty() {
            return Err("location is required".to_string());
        }
        if self.days < 1 {
            return Err("days must be at least 1".to_string());
        }
        if self.people < 1 {
            return Err("people must be at least 1".to_string());
        }
        Ok(())
    }

    /// Location text used as geocoding context for every activity
    pub fn location_context(&self) -> &str {
        self.location.trim()
    }
}
