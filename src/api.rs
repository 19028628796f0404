use crate::config::ApiConfig;
use crate::error::SubmitError;
use crate::models::{RiskRequest, RiskResponse};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Anything that can turn a [`RiskRequest`] into a [`RiskResponse`].
pub trait RiskService: Send + Sync {
    fn calculate(
        &self,
        request: &RiskRequest,
    ) -> impl Future<Output = Result<RiskResponse, SubmitError>> + Send;
}

/// HTTP client for the risk-calculation endpoint.
pub struct RiskClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl RiskClient {
    pub fn new(config: &ApiConfig) -> Result<Self, SubmitError> {
        Ok(Self {
            client: Client::builder().build()?,
            endpoint: config.endpoint.clone(),
            timeout: config.request_timeout(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn exchange(&self, request: &RiskRequest) -> Result<RiskResponse, SubmitError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        debug!("Response status: {}", status);
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Risk API returned {}: {}", status, body);
            return Err(SubmitError::Api {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let body: serde_json::Value = serde_json::from_str(&text)?;
        Ok(RiskResponse::from_json(&body))
    }
}

impl RiskService for RiskClient {
    /// Posts the request, bounded by the configured timeout. On expiry the
    /// in-flight request is dropped and [`SubmitError::Timeout`] returned.
    async fn calculate(&self, request: &RiskRequest) -> Result<RiskResponse, SubmitError> {
        debug!(?request, "Sending risk request to {}", self.endpoint);
        match tokio::time::timeout(self.timeout, self.exchange(request)).await {
            Ok(Err(SubmitError::Transport(e))) if e.is_timeout() => Err(SubmitError::Timeout {
                after: self.timeout,
            }),
            Ok(result) => result,
            Err(_) => {
                warn!("Risk request cancelled after {:?}", self.timeout);
                Err(SubmitError::Timeout {
                    after: self.timeout,
                })
            }
        }
    }
}
