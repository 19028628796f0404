use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// The location sent to the risk service. Exactly one representation is
/// ever serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LocationInput {
    City { city_name: String },
    Coordinates { lat: f64, lon: f64 },
}

/// Outbound body for `POST /calculate_risk`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskRequest {
    pub age: u32,
    pub condition: String,
    #[serde(flatten)]
    pub location: LocationInput,
}

/// What the risk service answers with. Every field is optional; anything
/// missing or of an unexpected type stays `None` instead of failing the
/// whole response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskResponse {
    pub heat_index: Option<f64>,
    pub wbgt: Option<f64>,
    pub final_risk: Option<String>,
    pub risk_bucket: Option<String>,
    pub risk_label: Option<String>,
}

impl RiskResponse {
    /// Decodes a response body that has already been parsed as JSON.
    ///
    /// Each field is read on its own. Some server builds answer with
    /// `lisk_level` next to (or instead of) `final_risk`; it is logged and
    /// never stored.
    pub fn from_json(body: &Value) -> Self {
        match body {
            Value::Object(map) => {
                let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                debug!(?keys, "Risk response keys");
                if let Some(level) = map.get("lisk_level") {
                    warn!(%level, "Server returned 'lisk_level'; ignoring it");
                }
            }
            other => warn!(%other, "Risk response is not a JSON object"),
        }

        Self {
            heat_index: number_field(body, "heat_index"),
            wbgt: number_field(body, "wbgt"),
            final_risk: text_field(body, "final_risk"),
            risk_bucket: text_field(body, "risk_bucket"),
            risk_label: text_field(body, "risk_label"),
        }
    }
}

fn number_field(body: &Value, key: &str) -> Option<f64> {
    let value = body.get(key).filter(|v| !v.is_null())?;
    let number = value.as_f64();
    if number.is_none() {
        warn!(key, %value, "Ignoring non-numeric response field");
    }
    number
}

fn text_field(body: &Value, key: &str) -> Option<String> {
    let value = body.get(key).filter(|v| !v.is_null())?;
    let text = value.as_str().map(str::to_string);
    if text.is_none() {
        warn!(key, %value, "Ignoring non-string response field");
    }
    text
}

/// The record persisted after a successful calculation and shown on the
/// results view. Absent values serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub city_name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub age: String,
    pub condition: String,
    #[serde(rename = "heatIndex")]
    pub heat_index: Option<f64>,
    pub wbgt: Option<f64>,
    #[serde(rename = "riskLevel")]
    pub risk_level: Option<String>,
    #[serde(rename = "riskBucket")]
    pub risk_bucket: Option<String>,
    #[serde(rename = "riskLabel")]
    pub risk_label: Option<String>,
}

impl RiskResult {
    /// Builds the stored record from what was sent and what came back.
    ///
    /// `age` and `condition` keep the trimmed text the user typed. `coords`
    /// are the form's finite coordinates; they are kept even when the city
    /// name was the one sent.
    pub fn new(
        request: &RiskRequest,
        age: &str,
        coords: Option<Coordinates>,
        response: RiskResponse,
    ) -> Self {
        let (city_name, sent) = match &request.location {
            LocationInput::City { city_name } => (Some(city_name.clone()), None),
            LocationInput::Coordinates { lat, lon } => (
                None,
                Some(Coordinates {
                    latitude: *lat,
                    longitude: *lon,
                }),
            ),
        };
        let coords = coords.or(sent);

        Self {
            city_name,
            lat: coords.map(|c| c.latitude),
            lon: coords.map(|c| c.longitude),
            age: age.to_string(),
            condition: request.condition.clone(),
            heat_index: response.heat_index,
            wbgt: response.wbgt,
            risk_level: response.final_risk,
            risk_bucket: response.risk_bucket,
            risk_label: response.risk_label,
        }
    }

    /// Human-readable location line for the results view.
    pub fn location_label(&self) -> String {
        match (&self.city_name, self.lat, self.lon) {
            (Some(city), _, _) => city.clone(),
            (None, Some(lat), Some(lon)) => format!("{:.4}, {:.4}", lat, lon),
            _ => "Unknown".to_string(),
        }
    }
}
