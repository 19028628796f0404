//! Form input resolution: trimming, validation, and choosing which location
//! representation goes on the wire.

use crate::error::ValidationError;
use crate::models::{Coordinates, LocationInput, RiskRequest};
use serde::{Deserialize, Serialize};

/// Which location sources a submission may draw from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationStrategy {
    /// City name if present, otherwise acquired coordinates.
    #[default]
    Either,
    /// Only the typed city name.
    City,
    /// Only the acquired coordinates.
    Coordinates,
}

/// Raw text of the form fields, as the user left them.
///
/// `lat` and `lon` are the hidden fields filled in by the acquirer; they stay
/// empty when acquisition failed or was skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskInputForm {
    pub age: String,
    pub condition: String,
    pub city_name: String,
    pub lat: String,
    pub lon: String,
}

impl RiskInputForm {
    pub fn set_coordinates(&mut self, coords: Coordinates) {
        self.lat = coords.latitude.to_string();
        self.lon = coords.longitude.to_string();
    }

    /// Trimmed city name, `None` when blank.
    pub fn city(&self) -> Option<&str> {
        Some(self.city_name.trim()).filter(|c| !c.is_empty())
    }

    /// Both hidden coordinates, only when each parses to a finite number.
    pub fn coordinates(&self) -> Option<Coordinates> {
        let parse = |raw: &str| {
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
        };
        Some(Coordinates {
            latitude: parse(&self.lat)?,
            longitude: parse(&self.lon)?,
        })
    }

    /// Validates the form and builds the outbound request.
    ///
    /// Checks run in order: required fields, age format, location. A city
    /// name beats coordinates whenever the strategy allows both.
    pub fn resolve(&self, strategy: LocationStrategy) -> Result<RiskRequest, ValidationError> {
        let age = self.age.trim();
        let condition = self.condition.trim();
        if age.is_empty() || condition.is_empty() {
            return Err(ValidationError::MissingRequired);
        }

        let age = age
            .parse::<u32>()
            .ok()
            .filter(|a| *a > 0)
            .ok_or(ValidationError::InvalidAge)?;

        let city = match strategy {
            LocationStrategy::Either | LocationStrategy::City => self.city(),
            LocationStrategy::Coordinates => None,
        };
        let coords = match strategy {
            LocationStrategy::Either | LocationStrategy::Coordinates => self.coordinates(),
            LocationStrategy::City => None,
        };

        let location = match (city, coords) {
            (Some(city_name), _) => LocationInput::City {
                city_name: city_name.to_string(),
            },
            (None, Some(c)) => LocationInput::Coordinates {
                lat: c.latitude,
                lon: c.longitude,
            },
            (None, None) => return Err(ValidationError::MissingLocation),
        };

        Ok(RiskRequest {
            age,
            condition: condition.to_string(),
            location,
        })
    }
}
