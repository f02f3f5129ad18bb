//! Local file serving for rewritten file references.

use std::path::Path as FsPath;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Serve `/<route>=<absolute path>` from the upload and output directories.
pub async fn serve_file(State(state): State<AppState>, Path(reference): Path<String>) -> ApiResult<Response> {
    let prefix = state.file_prefix();
    let requested = reference
        .trim_start_matches('/')
        .strip_prefix(&prefix)
        .ok_or_else(|| ApiError::not_found(format!("/{}", reference)))?;

    let resolved = tokio::fs::canonicalize(requested)
        .await
        .map_err(|_| ApiError::not_found(requested.to_string()))?;

    if !state.is_served(&resolved) {
        warn!(path = %resolved.display(), "Refused to serve file outside data dirs");
        return Err(ApiError::forbidden("file is outside the served directories"));
    }

    let bytes = tokio::fs::read(&resolved)
        .await
        .map_err(|_| ApiError::not_found(requested.to_string()))?;

    Ok(([(header::CONTENT_TYPE, content_type(&resolved))], bytes).into_response())
}

fn content_type(path: &FsPath) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
