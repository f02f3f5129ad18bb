//! Prediction service wire types.
//!
//! The service follows the prediction-queue protocol: `POST /predictions`
//! answers `201` with a follow-up URL, which is polled until the job settles.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of a prediction submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PredictionRequest {
    /// Field name to value, in contract order
    pub input: Map<String, Value>,
}

/// Status reported by the prediction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    Starting,
    Queued,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    /// Status this client does not know; treated as still running
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionStatus::Starting => "starting",
            PredictionStatus::Queued => "queued",
            PredictionStatus::Processing => "processing",
            PredictionStatus::Succeeded => "succeeded",
            PredictionStatus::Failed => "failed",
            PredictionStatus::Canceled => "canceled",
            PredictionStatus::Unknown => "unknown",
        }
    }

    /// Check if no more status changes are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PredictionStatus::Succeeded | PredictionStatus::Failed | PredictionStatus::Canceled
        )
    }

    /// Check if the job ended without a result.
    pub fn is_failure(&self) -> bool {
        matches!(self, PredictionStatus::Failed | PredictionStatus::Canceled)
    }
}

impl fmt::Display for PredictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Follow-up locations for an accepted prediction.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PredictionUrls {
    /// Polling location
    pub get: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel: Option<String>,
}

/// Prediction as returned by submission and polling calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PredictionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PredictionStatus>,

    /// Raw output: scalar, list, or list of lists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<PredictionUrls>,
}

impl PredictionResponse {
    /// Error detail reported by the service, if any.
    pub fn error_message(&self) -> Option<String> {
        match &self.error {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

/// Lifecycle of one submission.
///
/// `Built -> Submitted -> Polling -> Succeeded | Failed`, or
/// `Built -> Submitted -> Rejected` when the service refuses the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Built,
    Submitted,
    Polling,
    Succeeded,
    Failed,
    Rejected,
}

impl SubmissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionState::Built => "built",
            SubmissionState::Submitted => "submitted",
            SubmissionState::Polling => "polling",
            SubmissionState::Succeeded => "succeeded",
            SubmissionState::Failed => "failed",
            SubmissionState::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionState::Succeeded | SubmissionState::Failed | SubmissionState::Rejected
        )
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepted_response() {
        let body = json!({
            "id": "abc",
            "status": "starting",
            "urls": {"get": "http://localhost:5000/predictions/abc", "cancel": "http://localhost:5000/predictions/abc/cancel"}
        });
        let response: PredictionResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.status, Some(PredictionStatus::Starting));
        assert_eq!(response.urls.unwrap().get, "http://localhost:5000/predictions/abc");
        assert!(response.output.is_none());
    }

    #[test]
    fn test_unknown_status_is_not_terminal() {
        let response: PredictionResponse = serde_json::from_value(json!({"status": "booting"})).unwrap();
        let status = response.status.unwrap();
        assert_eq!(status, PredictionStatus::Unknown);
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(PredictionStatus::Succeeded.is_terminal());
        assert!(PredictionStatus::Failed.is_failure());
        assert!(PredictionStatus::Canceled.is_failure());
        assert!(!PredictionStatus::Queued.is_terminal());
        assert!(!PredictionStatus::Processing.is_terminal());
    }

    #[test]
    fn test_error_message() {
        let response: PredictionResponse =
            serde_json::from_value(json!({"status": "failed", "error": "no face detected"})).unwrap();
        assert_eq!(response.error_message().as_deref(), Some("no face detected"));

        let response: PredictionResponse = serde_json::from_value(json!({"status": "failed", "error": null})).unwrap();
        assert!(response.error_message().is_none());
    }

    #[test]
    fn test_submission_state_terminals() {
        assert!(!SubmissionState::Built.is_terminal());
        assert!(!SubmissionState::Polling.is_terminal());
        assert!(SubmissionState::Rejected.is_terminal());
        assert_eq!(SubmissionState::default(), SubmissionState::Built);
    }
}
