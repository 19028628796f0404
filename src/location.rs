//! Device location acquisition for the heat-risk form.
//!
//! [`acquire`] makes a single, time-bounded attempt to obtain coordinates
//! from a [`PositionSource`]. It never retries and never submits anything:
//! the caller decides what to show, and the form falls back to a typed city
//! name when this comes back [`Acquisition::Unavailable`].

use crate::config::LocationConfig;
use crate::error::LocationError;
use crate::models::Coordinates;
use ipgeolocate::{Locator, Service};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// A provider of the device's current position.
pub trait PositionSource: Send + Sync {
    /// Whether the capability exists at all. When `false`, no lookup is made.
    fn is_available(&self) -> bool;

    fn current_position(&self) -> impl Future<Output = Result<Coordinates, LocationError>> + Send;
}

/// Why no coordinates were obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionFailure {
    Unsupported,
    TimedOut,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Acquisition {
    Acquired(Coordinates),
    Unavailable(AcquisitionFailure),
}

/// Races one lookup against `timeout`; whichever settles first wins.
///
/// On timeout the lookup future is dropped and whatever it would have
/// produced is ignored.
pub async fn acquire<P: PositionSource>(source: &P, timeout: Duration) -> Acquisition {
    if !source.is_available() {
        info!("Geolocation unavailable, falling back to manual city input");
        return Acquisition::Unavailable(AcquisitionFailure::Unsupported);
    }

    match tokio::time::timeout(timeout, source.current_position()).await {
        Ok(Ok(coords)) => {
            info!(
                "Geolocation successful - ({}, {})",
                coords.latitude, coords.longitude
            );
            Acquisition::Acquired(coords)
        }
        Ok(Err(e)) => {
            warn!("Geolocation failed: {}", e);
            Acquisition::Unavailable(AcquisitionFailure::Failed(e.to_string()))
        }
        Err(_) => {
            warn!("Geolocation timed out after {:?}", timeout);
            Acquisition::Unavailable(AcquisitionFailure::TimedOut)
        }
    }
}

/// IP-based position lookup through [ip-api](https://ip-api.com/).
#[derive(Debug, Clone)]
pub struct IpApiSource {
    enabled: bool,
    ip: String,
}

impl IpApiSource {
    pub fn new(config: &LocationConfig) -> Self {
        Self {
            enabled: config.use_geolocation,
            ip: config.lookup_ip.clone(),
        }
    }
}

impl PositionSource for IpApiSource {
    fn is_available(&self) -> bool {
        self.enabled
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        let loc = Locator::get(&self.ip, Service::IpApi)
            .await
            .map_err(|e| LocationError::Service(e.to_string()))?;
        Ok(Coordinates {
            latitude: parse_degrees(&loc.latitude)?,
            longitude: parse_degrees(&loc.longitude)?,
        })
    }
}

fn parse_degrees(raw: &str) -> Result<f64, LocationError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LocationError::BadCoordinate(raw.to_string()))
}
