use crate::form::LocationStrategy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const CONFIG_PATH: &str = "config.toml";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub location: LocationConfig,
    pub storage: StorageConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,        // POST target for risk calculation
    pub request_timeout_ms: u64, // Request is cancelled after this long
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LocationConfig {
    pub use_geolocation: bool,       // Try IP geolocation on start-up
    pub lookup_ip: String,           // Address to geolocate; empty means our own
    pub acquisition_timeout_ms: u64, // Give up waiting for a position after this long
    pub strategy: LocationStrategy,  // either | city | coordinates
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://fumist.pythonanywhere.com/calculate_risk".to_string(),
            request_timeout_ms: 15_000,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            use_geolocation: true,
            lookup_ip: String::new(),
            acquisition_timeout_ms: 15_000,
            strategy: LocationStrategy::Either,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("heat_risk.db"),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl LocationConfig {
    pub fn acquisition_timeout(&self) -> Duration {
        Duration::from_millis(self.acquisition_timeout_ms)
    }
}

impl Config {
    /// Loads config.toml from the working directory.
    /// If it doesn't exist, creates a default one.
    pub fn load() -> Self {
        Self::load_from(Path::new(CONFIG_PATH))
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => return config,
                Err(e) => {
                    warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    return Self::default();
                }
            },
            Err(_) => info!("No {} found, writing defaults.", path.display()),
        }

        let default_config = Self::default();

        // Save default config to disk for the user to edit later
        match toml::to_string_pretty(&default_config) {
            Ok(toml_string) => {
                if fs::write(path, toml_string).is_err() {
                    warn!("Could not write default {} to disk.", path.display());
                }
            }
            Err(e) => warn!("Could not serialize default config: {}", e),
        }

        default_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_from(&path);
        assert_eq!(config, Config::default());
        assert_eq!(config.api.request_timeout(), Duration::from_millis(15_000));
        assert_eq!(
            config.location.acquisition_timeout(),
            Duration::from_millis(15_000)
        );

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("calculate_risk"));
        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[api]\nrequest_timeout_ms = 500\n\n[location]\nstrategy = \"city\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path);
        assert_eq!(config.api.request_timeout_ms, 500);
        assert_eq!(config.api.endpoint, ApiConfig::default().endpoint);
        assert_eq!(config.location.strategy, LocationStrategy::City);
        assert!(config.location.use_geolocation);
    }

    #[test]
    fn unparsable_file_falls_back_without_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is = = not toml").unwrap();

        assert_eq!(Config::load_from(&path), Config::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), "this is = = not toml");
    }
}
