//! The submission controller: validate, call the risk service, persist.
//!
//! One controller serves one form. Overlapping calls are rejected with
//! [`SubmitError::AlreadySubmitting`] through an atomic in-flight flag, so a
//! second submission cannot start even when the caller bypasses the UI's
//! disabled submit button.

use crate::api::RiskService;
use crate::db::ResultStore;
use crate::error::SubmitError;
use crate::form::{LocationStrategy, RiskInputForm};
use crate::models::RiskResult;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Succeeded,
}

/// Clears the in-flight flag when dropped, whichever way `submit` exits.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct SubmissionController<S> {
    service: S,
    store: ResultStore,
    strategy: LocationStrategy,
    in_flight: AtomicBool,
    state: Mutex<SubmissionState>,
}

impl<S: RiskService> SubmissionController<S> {
    pub fn new(service: S, store: ResultStore, strategy: LocationStrategy) -> Self {
        Self {
            service,
            store,
            strategy,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(SubmissionState::Idle),
        }
    }

    pub fn state(&self) -> SubmissionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: SubmissionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Runs one submission end to end.
    ///
    /// Validation failures return before any network call. On success the
    /// result has already been written to the store when this returns.
    pub async fn submit(&self, form: &RiskInputForm) -> Result<RiskResult, SubmitError> {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            return Err(SubmitError::AlreadySubmitting);
        };

        self.set_state(SubmissionState::Validating);
        let request = match form.resolve(self.strategy) {
            Ok(request) => request,
            Err(e) => {
                info!("Submission rejected: {}", e);
                self.set_state(SubmissionState::Idle);
                return Err(e.into());
            }
        };

        self.set_state(SubmissionState::Submitting);
        let outcome = async {
            let response = self.service.calculate(&request).await?;
            let result =
                RiskResult::new(&request, form.age.trim(), form.coordinates(), response);

            // SQLite work stays off the async workers.
            let store = self.store.clone();
            let record = result.clone();
            tokio::task::spawn_blocking(move || store.save(&record)).await??;
            Ok::<_, SubmitError>(result)
        }
        .await;

        match &outcome {
            Ok(result) => {
                info!(
                    "Risk calculated for {}: {:?}",
                    result.location_label(),
                    result.risk_level
                );
                self.set_state(SubmissionState::Succeeded);
            }
            Err(e) => {
                error!("Submission failed: {}", e);
                self.set_state(SubmissionState::Idle);
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LocationInput, RiskRequest, RiskResponse};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeService {
        calls: AtomicUsize,
        last: Mutex<Option<RiskRequest>>,
        fail_with_status: Option<u16>,
        gate: Option<Arc<Notify>>,
    }

    impl RiskService for FakeService {
        async fn calculate(&self, request: &RiskRequest) -> Result<RiskResponse, SubmitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(request.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(status) = self.fail_with_status {
                return Err(SubmitError::Api { status });
            }
            Ok(RiskResponse {
                heat_index: Some(38.2),
                wbgt: Some(29.1),
                final_risk: Some("high".into()),
                ..RiskResponse::default()
            })
        }
    }

    fn tokyo_form() -> RiskInputForm {
        RiskInputForm {
            age: " 34 ".into(),
            condition: "asthma".into(),
            city_name: "Tokyo".into(),
            lat: "35.6".into(),
            lon: "139.7".into(),
        }
    }

    fn controller(
        service: FakeService,
    ) -> (SubmissionController<FakeService>, ResultStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path().join("risk.db")).unwrap();
        let ctl = SubmissionController::new(service, store.clone(), LocationStrategy::Either);
        (ctl, store, dir)
    }

    #[tokio::test]
    async fn success_persists_and_sends_city_only() {
        let (ctl, store, _dir) = controller(FakeService::default());

        let result = ctl.submit(&tokyo_form()).await.unwrap();
        assert_eq!(ctl.state(), SubmissionState::Succeeded);
        assert!(!ctl.is_submitting());

        let sent = ctl.service.last.lock().unwrap().clone().unwrap();
        assert_eq!(
            sent.location,
            LocationInput::City {
                city_name: "Tokyo".into()
            }
        );
        assert_eq!(result.age, "34");
        assert_eq!(result.lat, Some(35.6));
        assert_eq!(result.risk_bucket, None);
        assert_eq!(store.load().unwrap(), Some(result));
    }

    #[tokio::test]
    async fn validation_failure_makes_no_call() {
        let (ctl, store, _dir) = controller(FakeService::default());
        let form = RiskInputForm {
            city_name: String::new(),
            lat: String::new(),
            ..tokyo_form()
        };

        let err = ctl.submit(&form).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(ctl.service.calls.load(Ordering::SeqCst), 0);
        assert_eq!(ctl.state(), SubmissionState::Idle);
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn api_failure_returns_to_idle_without_storing() {
        let (ctl, store, _dir) = controller(FakeService {
            fail_with_status: Some(500),
            ..FakeService::default()
        });

        let err = ctl.submit(&tokyo_form()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Api { status: 500 }));
        assert_eq!(ctl.state(), SubmissionState::Idle);
        assert!(!ctl.is_submitting());
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn overlapping_submission_is_rejected() {
        let gate = Arc::new(Notify::new());
        let (ctl, _store, _dir) = controller(FakeService {
            gate: Some(gate.clone()),
            ..FakeService::default()
        });
        let ctl = Arc::new(ctl);

        let first = tokio::spawn({
            let ctl = ctl.clone();
            async move { ctl.submit(&tokyo_form()).await }
        });

        while !ctl.is_submitting() || ctl.state() != SubmissionState::Submitting {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let second = ctl.submit(&tokyo_form()).await;
        assert!(matches!(second, Err(SubmitError::AlreadySubmitting)));

        gate.notify_one();
        assert!(first.await.unwrap().is_ok());
        assert_eq!(ctl.service.calls.load(Ordering::SeqCst), 1);
        assert!(!ctl.is_submitting());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn city_submission_keeps_form_coordinates_in_store() {
        let (ctl, store, _dir) = controller(FakeService::default());

        let result = ctl.submit(&tokyo_form()).await.unwrap();
        assert_eq!(result.city_name.as_deref(), Some("Tokyo"));
        assert_eq!(result.lat, Some(35.6));
        assert_eq!(result.lon, Some(139.7));

        let raw = store.load_raw().unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["lat"], 35.6);
        assert_eq!(json["lon"], 139.7);
        let sent = ctl.service.last.lock().unwrap().clone().unwrap();
        assert!(matches!(sent.location, LocationInput::City { .. }));
    }
}
