//! Application state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use xedit_media::ImagePreprocessor;
use xedit_models::ImageRef;
use xedit_predictor::{PredictionClient, PredictorConfig};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub predictor: Arc<PredictionClient>,
    pub preprocessor: Arc<ImagePreprocessor>,
    /// Serialises submissions the way the editor's request queue does
    pub predict_gate: Arc<Semaphore>,
    /// Cancelled on shutdown; in-flight predictions stop polling
    pub shutdown: CancellationToken,
    /// Canonical directories the file route may serve from
    pub served_roots: Arc<Vec<PathBuf>>,
}

impl AppState {
    /// Create new application state.
    ///
    /// Output images are downloaded into `config.output_dir`.
    pub fn new(config: ApiConfig, mut predictor_config: PredictorConfig) -> ApiResult<Self> {
        std::fs::create_dir_all(&config.upload_dir)
            .map_err(|e| ApiError::internal(format!("cannot create upload dir: {}", e)))?;
        std::fs::create_dir_all(&config.output_dir)
            .map_err(|e| ApiError::internal(format!("cannot create output dir: {}", e)))?;

        let served_roots = [&config.upload_dir, &config.output_dir]
            .into_iter()
            .map(std::fs::canonicalize)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ApiError::internal(format!("cannot resolve data dirs: {}", e)))?;

        predictor_config.download_dir = Some(config.output_dir.clone());
        let predictor = PredictionClient::new(predictor_config)?;
        let preprocessor = ImagePreprocessor::new(&config.upload_dir);
        let predict_gate = Semaphore::new(config.predict_concurrency.max(1));

        Ok(Self {
            config,
            predictor: Arc::new(predictor),
            preprocessor: Arc::new(preprocessor),
            predict_gate: Arc::new(predict_gate),
            shutdown: CancellationToken::new(),
            served_roots: Arc::new(served_roots),
        })
    }

    /// Route prefix of served files, e.g. `file=`.
    pub fn file_prefix(&self) -> String {
        format!("{}=", self.predictor.rewriter().route())
    }

    /// Whether `path` (canonical) lies in a served directory.
    pub fn is_served(&self, path: &Path) -> bool {
        self.served_roots.iter().any(|root| path.starts_with(root))
    }

    /// URL a browser can load an output image from.
    pub fn display_url(&self, image: &ImageRef) -> ApiResult<String> {
        match image {
            ImageRef::Url(url) => Ok(url.clone()),
            ImageRef::Local(path) => Ok(self.predictor.rewriter().rewrite(path)?),
        }
    }
}
