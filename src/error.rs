//! Error types shared by the form, the controller, storage and the acquirer.

use std::time::Duration;
use thiserror::Error;

/// Input rejected before any network call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter your age and condition.")]
    MissingRequired,
    #[error("Age must be a whole number greater than zero.")]
    InvalidAge,
    #[error("Enter a city name or allow location access.")]
    MissingLocation,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not encode stored record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("a submission is already in flight")]
    AlreadySubmitting,
    #[error("risk request timed out after {} ms", .after.as_millis())]
    Timeout { after: Duration },
    #[error("API request failed: {status}")]
    Api { status: u16 },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("storage task failed: {0}")]
    StoreTask(#[from] tokio::task::JoinError),
}

impl SubmitError {
    /// Text for the blocking alert shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::AlreadySubmitting => "A calculation is already in progress.".to_string(),
            Self::Timeout { .. } => {
                "The server took too long to respond. Check your connection and try again."
                    .to_string()
            }
            _ => "Something went wrong. Please try again later.".to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LocationError {
    #[error("geolocation service error: {0}")]
    Service(String),
    #[error("service returned an unusable coordinate: {0:?}")]
    BadCoordinate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_wording_differs_from_generic_failures() {
        let timeout = SubmitError::Timeout {
            after: Duration::from_millis(15000),
        };
        let api = SubmitError::Api { status: 502 };
        assert_ne!(timeout.user_message(), api.user_message());
        assert_eq!(timeout.to_string(), "risk request timed out after 15000 ms");
        assert_eq!(api.to_string(), "API request failed: 502");
    }

    #[test]
    fn validation_errors_surface_their_own_text() {
        let err = SubmitError::from(ValidationError::MissingLocation);
        assert!(err.is_validation());
        assert_eq!(
            err.user_message(),
            "Enter a city name or allow location access."
        );
    }
}
