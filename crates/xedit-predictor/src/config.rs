//! Prediction client configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the prediction client.
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// Submission endpoint of the prediction service
    pub predictions_url: String,
    /// Base URL under which this host serves local files to the service
    pub file_base_url: String,
    /// Route marker in rewritten file URLs (`<base>/<route>=<path>`)
    pub file_route: String,
    /// Pause before submitting, covering the service's startup race
    pub submit_delay: Duration,
    /// Pause before each status poll
    pub poll_interval: Duration,
    /// Pause before reporting a rejected submission
    pub failure_delay: Duration,
    /// Status polls allowed before giving up
    pub max_polls: u32,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Where remote and inline output images are saved; passed through when unset
    pub download_dir: Option<PathBuf>,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            predictions_url: "http://0.0.0.0:5000/predictions".to_string(),
            file_base_url: "http://0.0.0.0:7860".to_string(),
            file_route: "file".to_string(),
            submit_delay: Duration::from_millis(500),
            poll_interval: Duration::from_millis(500),
            failure_delay: Duration::from_secs(1),
            max_polls: 1200, // 10 minutes at the default interval
            request_timeout: Duration::from_secs(60),
            download_dir: None,
        }
    }
}

impl PredictorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            predictions_url: std::env::var("PREDICTIONS_URL").unwrap_or(defaults.predictions_url),
            file_base_url: std::env::var("FILE_BASE_URL").unwrap_or(defaults.file_base_url),
            file_route: std::env::var("FILE_ROUTE").unwrap_or(defaults.file_route),
            submit_delay: env_millis("SUBMIT_DELAY_MS").unwrap_or(defaults.submit_delay),
            poll_interval: env_millis("POLL_INTERVAL_MS").unwrap_or(defaults.poll_interval),
            failure_delay: env_millis("FAILURE_DELAY_MS").unwrap_or(defaults.failure_delay),
            max_polls: std::env::var("MAX_POLLS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_polls),
            request_timeout: std::env::var("PREDICT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            download_dir: std::env::var("OUTPUT_DIR").ok().map(PathBuf::from),
        }
    }

    /// Config with every fixed pause removed.
    pub fn without_delays(mut self) -> Self {
        self.submit_delay = Duration::ZERO;
        self.poll_interval = Duration::ZERO;
        self.failure_delay = Duration::ZERO;
        self
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_millis)
}
