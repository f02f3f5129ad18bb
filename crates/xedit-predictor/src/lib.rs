//! Client for the expression-editing prediction service.
//!
//! This crate builds the request payload from the editor parameters, submits
//! it, polls the job until it settles and turns the raw output into
//! display-ready values for the declared result slots.

pub mod client;
pub mod config;
pub mod error;
pub mod normalize;
pub mod payload;
pub mod resolve;

pub use client::PredictionClient;
pub use config::PredictorConfig;
pub use error::{PredictError, PredictResult};
pub use normalize::normalize_output;
pub use payload::{build_payload, FileRewriter};
pub use resolve::OutputResolver;
