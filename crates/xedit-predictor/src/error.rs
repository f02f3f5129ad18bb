//! Prediction client error types.

use std::path::PathBuf;

use thiserror::Error;
use xedit_models::OutputSlot;

pub type PredictResult<T> = Result<T, PredictError>;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("No such file: '{}'", .0.display())]
    FileNotFound(PathBuf),

    #[error("Prediction failed: {}", .0.as_deref().unwrap_or("no detail reported"))]
    JobFailed(Option<String>),

    #[error("Prediction service is still starting up")]
    ServiceBusy,

    #[error("Submission rejected with status {status}")]
    Submission { status: u16 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Expected {expected} output values, got {actual}")]
    OutputMismatch { expected: usize, actual: usize },

    #[error("Unexpected value for {slot} slot: {message}")]
    MalformedOutput { slot: OutputSlot, message: String },

    #[error("Prediction still running after {0} polls")]
    PollLimitExceeded(u32),

    #[error("Prediction cancelled")]
    Cancelled,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PredictError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    pub fn malformed_output(slot: OutputSlot, msg: impl Into<String>) -> Self {
        Self::MalformedOutput {
            slot,
            message: msg.into(),
        }
    }

    /// Message shown to the person using the editor.
    pub fn user_message(&self) -> String {
        match self {
            PredictError::JobFailed(_) => "The submission failed!".to_string(),
            PredictError::ServiceBusy => {
                "Sorry, the model is still warming up. Try again in a bit.".to_string()
            }
            PredictError::Submission { status } => {
                format!("The submission failed! Error: {}", status)
            }
            PredictError::PollLimitExceeded(_) => {
                "The submission is taking too long. Try again in a bit.".to_string()
            }
            other => other.to_string(),
        }
    }
}
