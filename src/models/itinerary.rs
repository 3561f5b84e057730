use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Latitude/longitude pair. `[0.0, 0.0]` is the "unresolved" sentinel, not a real position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coords {
    pub lat: f64,
    pub lon: f64,
}

impl Coords {
    pub const UNKNOWN: Coords = Coords { lat: 0.0, lon: 0.0 };

    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_unknown(&self) -> bool {
        self.lat == 0.0 && self.lon == 0.0
    }
}

impl Default for Coords {
    fn default() -> Self {
        Coords::UNKNOWN
    }
}

impl Serialize for Coords {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        [self.lat, self.lon].serialize(serializer)
    }
}

// Anything that is not a pair of finite numbers reads as the sentinel
impl<'de> Deserialize<'de> for Coords {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let coords = match value {
            Value::Array(items) if items.len() == 2 => {
                match (lenient_number(&items[0]), lenient_number(&items[1])) {
                    (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                        Coords::new(lat, lon)
                    }
                    _ => Coords::UNKNOWN,
                }
            }
            _ => Coords::UNKNOWN,
        };
        Ok(coords)
    }
}

fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }
}

// Models write costs as 500, "500" or "₹500"; anything unreadable becomes 0
fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Value::deserialize(deserializer)?;
    Ok(lenient_number(&value).filter(|n| n.is_finite()).unwrap_or(0.0))
}

fn deserialize_lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Value::deserialize(deserializer)?;
    match lenient_number(&value) {
        Some(n) if n.is_finite() && n > 0.0 => Ok(n.round().min(u32::MAX as f64) as u32),
        _ => Ok(0),
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn deserialize_activities<'de, D>(deserializer: D) -> Result<Vec<Activity>, D::Error>
where
    D: Deserializer<'de>,
{
    let activities: Option<Vec<Activity>> = Option::deserialize(deserializer)?;
    Ok(activities.unwrap_or_default())
}

fn default_total_budget() -> String {
    "Flexible".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Activity {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub time: String,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub place: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub description: String,
    /// Cost per person.
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub cost: f64,
    /// Minutes.
    #[serde(default, deserialize_with = "deserialize_lenient_u32")]
    pub duration: u32,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub priority: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub energy: String,
    #[serde(default)]
    pub coords: Coords,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<String>,
    /// Fields the model added that we do not interpret, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Day {
    #[serde(default, deserialize_with = "deserialize_lenient_u32")]
    pub day: u32,
    #[serde(default, deserialize_with = "deserialize_activities")]
    pub activities: Vec<Activity>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Itinerary {
    #[serde(default, deserialize_with = "deserialize_text")]
    pub trip_name: String,
    #[serde(default = "default_total_budget", deserialize_with = "deserialize_text")]
    pub total_budget: String,
    pub itinerary: Vec<Day>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Itinerary {
    pub fn activity_count(&self) -> usize {
        self.itinerary.iter().map(|d| d.activities.len()).sum()
    }
}
