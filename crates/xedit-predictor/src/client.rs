//! Prediction service HTTP client.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use xedit_models::{
    ExpressionParams, NormalizedOutput, OutputSlot, PredictionRequest, PredictionResponse, SubmissionState,
};

use crate::config::PredictorConfig;
use crate::error::{PredictError, PredictResult};
use crate::normalize::normalize_output;
use crate::payload::{build_payload, FileRewriter};
use crate::resolve::OutputResolver;

/// Client for the prediction service.
pub struct PredictionClient {
    http: Client,
    config: PredictorConfig,
    rewriter: FileRewriter,
    resolver: OutputResolver,
}

impl PredictionClient {
    /// Create a new prediction client.
    pub fn new(config: PredictorConfig) -> PredictResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(PredictError::Network)?;

        let rewriter = FileRewriter::new(&config.file_base_url, &config.file_route);
        let resolver = OutputResolver::new(http.clone(), config.download_dir.clone());

        Ok(Self {
            http,
            config,
            rewriter,
            resolver,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> PredictResult<Self> {
        Self::new(PredictorConfig::from_env())
    }

    pub fn rewriter(&self) -> &FileRewriter {
        &self.rewriter
    }

    /// Check if the prediction service reports itself ready.
    pub async fn health_check(&self) -> PredictResult<bool> {
        let url = Url::parse(&self.config.predictions_url)
            .and_then(|base| base.join("/health-check"))
            .map_err(|e| PredictError::invalid_response(format!("invalid predictions URL: {}", e)))?;

        match self.http.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                let body: serde_json::Value = response.json().await?;
                let status = body.get("status").and_then(|s| s.as_str()).unwrap_or_default();
                Ok(status.eq_ignore_ascii_case("ready") || status.eq_ignore_ascii_case("healthy"))
            }
            Ok(response) => {
                warn!("Prediction service health check failed: {}", response.status());
                Ok(false)
            }
            Err(e) => {
                warn!("Prediction service health check error: {}", e);
                Ok(false)
            }
        }
    }

    /// Build the request body for `params`.
    pub fn build_request(&self, params: &ExpressionParams) -> PredictResult<PredictionRequest> {
        build_payload(params, &self.rewriter)
    }

    /// Submit `params` and wait for the normalized result.
    pub async fn submit(
        &self,
        params: &ExpressionParams,
        slots: &[OutputSlot],
        cancel: &CancellationToken,
    ) -> PredictResult<NormalizedOutput> {
        let (state, _) = watch::channel(SubmissionState::Built);
        self.submit_observed(params, slots, cancel, &state).await
    }

    /// [`submit`](Self::submit), publishing each state transition on `state`.
    pub async fn submit_observed(
        &self,
        params: &ExpressionParams,
        slots: &[OutputSlot],
        cancel: &CancellationToken,
        state: &watch::Sender<SubmissionState>,
    ) -> PredictResult<NormalizedOutput> {
        state.send_replace(SubmissionState::Built);

        let result = match self.build_request(params) {
            Ok(request) => self.run(&request, slots, cancel, state).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => {
                state.send_replace(SubmissionState::Succeeded);
            }
            Err(e) => {
                let settled = *state.borrow();
                let final_state = if settled.is_terminal() {
                    settled
                } else {
                    state.send_replace(SubmissionState::Failed);
                    SubmissionState::Failed
                };
                warn!(state = %final_state, error = %e, "Prediction did not succeed");
            }
        }

        result
    }

    async fn run(
        &self,
        request: &PredictionRequest,
        slots: &[OutputSlot],
        cancel: &CancellationToken,
        state: &watch::Sender<SubmissionState>,
    ) -> PredictResult<NormalizedOutput> {
        self.pause(self.config.submit_delay, cancel).await?;

        debug!(
            url = %self.config.predictions_url,
            fields = request.input.len(),
            "Submitting prediction"
        );

        let response = self
            .http
            .post(&self.config.predictions_url)
            .json(request)
            .send()
            .await?;
        state.send_replace(SubmissionState::Submitted);

        let status = response.status();
        let prediction = match status {
            StatusCode::CREATED => {
                let accepted: PredictionResponse = response.json().await?;
                let follow_up = accepted
                    .urls
                    .map(|urls| urls.get)
                    .ok_or_else(|| PredictError::invalid_response("accepted prediction has no urls.get"))?;

                info!(id = ?accepted.id, url = %follow_up, "Prediction accepted");
                state.send_replace(SubmissionState::Polling);
                self.poll(&follow_up, cancel).await?
            }
            StatusCode::OK => response.json::<PredictionResponse>().await?,
            _ => {
                state.send_replace(SubmissionState::Rejected);
                warn!(status = %status, "Prediction submission rejected");
                let rejection = if status == StatusCode::CONFLICT {
                    PredictError::ServiceBusy
                } else {
                    PredictError::Submission {
                        status: status.as_u16(),
                    }
                };
                // Cancellation cuts the delay short but the rejection is still reported
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.config.failure_delay) => {}
                }
                return Err(rejection);
            }
        };

        if prediction.status.is_some_and(|s| s.is_failure()) {
            return Err(PredictError::JobFailed(prediction.error_message()));
        }

        let raw = prediction.output.unwrap_or_default();
        let normalized = normalize_output(raw, slots)?;
        let resolved = self.resolver.resolve(normalized).await?;

        info!(id = ?prediction.id, values = resolved.len(), "Prediction succeeded");
        Ok(resolved)
    }

    /// Poll `url` until the prediction settles.
    async fn poll(&self, url: &str, cancel: &CancellationToken) -> PredictResult<PredictionResponse> {
        for attempt in 1..=self.config.max_polls {
            self.pause(self.config.poll_interval, cancel).await?;

            let response = self.http.get(url).send().await?;
            if !response.status().is_success() {
                return Err(PredictError::Submission {
                    status: response.status().as_u16(),
                });
            }

            let prediction: PredictionResponse = response.json().await?;
            match prediction.status {
                Some(status) if status.is_terminal() => {
                    debug!(attempt, status = %status, "Prediction settled");
                    return Ok(prediction);
                }
                Some(status) => debug!(attempt, status = %status, "Prediction still running"),
                None => return Err(PredictError::invalid_response("status response has no status field")),
            }
        }

        Err(PredictError::PollLimitExceeded(self.config.max_polls))
    }

    /// Sleep for `delay` unless cancelled first.
    async fn pause(&self, delay: Duration, cancel: &CancellationToken) -> PredictResult<()> {
        if cancel.is_cancelled() {
            return Err(PredictError::Cancelled);
        }
        if delay.is_zero() {
            return Ok(());
        }

        tokio::select! {
            _ = cancel.cancelled() => Err(PredictError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}
