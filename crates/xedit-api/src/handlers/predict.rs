//! Prediction handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::info;
use validator::Validate;
use xedit_models::{ExpressionParams, NormalizedOutput, EDITOR_SLOTS};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Result of an edit.
#[derive(Serialize)]
pub struct PredictResponse {
    pub output: NormalizedOutput,
    /// Browser-loadable URLs of the image values, in slot order
    pub image_urls: Vec<String>,
}

/// Result of a reset followed by an edit.
#[derive(Serialize)]
pub struct ResetResponse {
    pub params: ExpressionParams,
    #[serde(flatten)]
    pub result: PredictResponse,
}

/// Submit the current parameters.
pub async fn predict(State(state): State<AppState>, Json(params): Json<ExpressionParams>) -> ApiResult<Json<PredictResponse>> {
    let result = run_prediction(&state, &params).await?;
    Ok(Json(result))
}

/// Zero the expression controls, then submit.
pub async fn reset(State(state): State<AppState>, Json(mut params): Json<ExpressionParams>) -> ApiResult<Json<ResetResponse>> {
    params.reset_expression();
    let result = run_prediction(&state, &params).await?;
    Ok(Json(ResetResponse { params, result }))
}

async fn run_prediction(state: &AppState, params: &ExpressionParams) -> ApiResult<PredictResponse> {
    params
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let _permit = state
        .predict_gate
        .acquire()
        .await
        .map_err(|_| ApiError::internal("prediction queue closed"))?;

    let cancel = state.shutdown.child_token();
    let output = state.predictor.submit(params, EDITOR_SLOTS, &cancel).await?;

    let image_urls = output
        .values()
        .filter_map(|value| value.as_image())
        .map(|image| state.display_url(image))
        .collect::<ApiResult<Vec<_>>>()?;

    info!(values = output.len(), "Edit completed");
    Ok(PredictResponse { output, image_urls })
}
