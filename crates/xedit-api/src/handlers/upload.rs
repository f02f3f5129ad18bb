//! Image upload handler.

use std::path::{Path, PathBuf};

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Multipart field carrying the portrait.
const IMAGE_FIELD: &str = "image";

/// Stored and preprocessed upload.
#[derive(Serialize)]
pub struct UploadResponse {
    /// Path to pass as the `image` parameter
    pub path: PathBuf,
    /// URL the image is served from
    pub url: String,
    /// Whether the image was downscaled
    pub resized: bool,
}

/// Store an uploaded portrait and prepare it for submission.
pub async fn upload_image(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request("image field has no file name"))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("failed to read upload: {}", e)))?;

        let stored = state.config.upload_dir.join(stored_name(&file_name));
        tokio::fs::write(&stored, &data)
            .await
            .map_err(|e| ApiError::internal(format!("failed to store upload: {}", e)))?;

        let processed = match state.preprocessor.process_async(stored.clone()).await {
            Ok(path) => path,
            Err(e) => {
                let _ = tokio::fs::remove_file(&stored).await;
                return Err(e.into());
            }
        };

        let resized = processed != stored;
        let url = state.predictor.rewriter().rewrite(&processed)?;
        info!(file_name = %file_name, path = %processed.display(), resized, "Stored upload");

        return Ok(Json(UploadResponse {
            path: processed,
            url,
            resized,
        }));
    }

    Err(ApiError::bad_request("missing image field"))
}

/// Unique on-disk name keeping the client's extension.
fn stored_name(file_name: &str) -> String {
    match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some(extension) => format!("upload-{}.{}", Uuid::new_v4(), extension.to_lowercase()),
        None => format!("upload-{}", Uuid::new_v4()),
    }
}
