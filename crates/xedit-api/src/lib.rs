//! HTTP front-end for the expression editor.
//!
//! This crate provides:
//! - Portrait upload with validation and downscaling
//! - Edit and reset endpoints backed by the prediction service
//! - Serving of uploaded and generated files to the service and the browser

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
