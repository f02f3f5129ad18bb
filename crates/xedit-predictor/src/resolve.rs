//! Materialises remote and inline output images as local files.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;
use uuid::Uuid;
use xedit_models::{ImageRef, NormalizedOutput, OutputValue};

use crate::error::{PredictError, PredictResult};

const DEFAULT_EXTENSION: &str = "png";

/// Resolves image references in a normalized output.
///
/// Without a download directory every value passes through unchanged.
#[derive(Debug, Clone)]
pub struct OutputResolver {
    http: Client,
    download_dir: Option<PathBuf>,
}

impl OutputResolver {
    pub fn new(http: Client, download_dir: Option<PathBuf>) -> Self {
        Self { http, download_dir }
    }

    /// Replace `http(s)` and `data:` image references with local files.
    pub async fn resolve(&self, output: NormalizedOutput) -> PredictResult<NormalizedOutput> {
        let Some(dir) = &self.download_dir else {
            return Ok(output);
        };

        let single = output.as_single().is_some();
        let mut resolved = Vec::with_capacity(output.len());
        for value in output.into_values() {
            resolved.push(match value {
                OutputValue::Image(ImageRef::Url(url)) => OutputValue::Image(ImageRef::Local(self.fetch(&url, dir).await?)),
                other => other,
            });
        }

        Ok(if single {
            NormalizedOutput::Single(resolved.remove(0))
        } else {
            NormalizedOutput::Many(resolved)
        })
    }

    async fn fetch(&self, url: &str, dir: &Path) -> PredictResult<PathBuf> {
        let (extension, bytes) = if let Some(data) = url.strip_prefix("data:") {
            decode_data_uri(data)?
        } else {
            let response = self.http.get(url).send().await?.error_for_status()?;
            let extension = extension_from_url(url)
                .or_else(|| {
                    response
                        .headers()
                        .get(CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        .and_then(extension_from_mime)
                })
                .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
            (extension, response.bytes().await?.to_vec())
        };

        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("output-{}.{}", Uuid::new_v4(), extension));
        tokio::fs::write(&path, &bytes).await?;

        debug!(path = %path.display(), size = bytes.len(), "Saved output image");
        Ok(path)
    }
}

/// Split `<mime>;base64,<payload>` into an extension and decoded bytes.
fn decode_data_uri(data: &str) -> PredictResult<(String, Vec<u8>)> {
    let (meta, payload) = data
        .split_once(',')
        .ok_or_else(|| PredictError::invalid_response("data URI without payload"))?;

    let mut parts = meta.split(';');
    let mime = parts.next().unwrap_or_default();
    if !parts.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(PredictError::invalid_response("only base64 data URIs are supported"));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| PredictError::invalid_response(format!("invalid base64 image: {}", e)))?;
    let extension = extension_from_mime(mime).unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    Ok((extension, bytes))
}

fn extension_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let name = path.rsplit('/').next()?;
    let (_, extension) = name.rsplit_once('.')?;
    let extension = extension.to_lowercase();
    matches!(extension.as_str(), "webp" | "jpg" | "jpeg" | "png" | "gif").then_some(extension)
}

fn extension_from_mime(mime: &str) -> Option<String> {
    let subtype = mime.trim().strip_prefix("image/")?;
    let subtype = subtype.split(';').next()?.trim().to_lowercase();
    match subtype.as_str() {
        "jpeg" | "jpg" => Some("jpg".to_string()),
        "png" | "webp" | "gif" => Some(subtype),
        _ => None,
    }
}
