//! Shared data models for the expression editor.
//!
//! This crate provides Serde-serializable types for:
//! - The fixed 18-field expression parameter schema
//! - Declared output slots and normalized output values
//! - Prediction service wire types and submission states

pub mod output;
pub mod params;
pub mod prediction;

// Re-export common types
pub use output::{ImageRef, NormalizedOutput, OutputSlot, OutputValue, EDITOR_SLOTS};
pub use params::{
    field, ExpressionParams, FieldDefault, FieldGroup, FieldKind, OutputFormat, ParamField,
    ParamValue, EXPRESSION_FIELDS, FIELD_COUNT, FIELD_NAMES, PARAM_FIELDS,
};
pub use prediction::{
    PredictionRequest, PredictionResponse, PredictionStatus, PredictionUrls, SubmissionState,
};
