//! Request payload construction.

use std::path::Path;

use serde_json::{Map, Value};
use xedit_models::{ExpressionParams, ParamValue, PredictionRequest};

use crate::error::{PredictError, PredictResult};

/// Turns local file paths into URLs the prediction service can fetch.
#[derive(Debug, Clone)]
pub struct FileRewriter {
    base_url: String,
    route: String,
}

impl FileRewriter {
    pub fn new(base_url: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            route: route.into().trim_matches('/').to_string(),
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    /// `<base>/<route>=<absolute path>` for an existing file.
    pub fn rewrite(&self, path: &Path) -> PredictResult<String> {
        if !path.exists() {
            return Err(PredictError::FileNotFound(path.to_path_buf()));
        }
        let absolute = std::fs::canonicalize(path)?;
        Ok(format!("{}/{}={}", self.base_url, self.route, absolute.display()))
    }
}

/// Build the request body from the editor parameters.
///
/// Fields keep contract order. Unset values and empty strings are left out;
/// zeros are kept. File references are rewritten to fetchable URLs.
pub fn build_payload(params: &ExpressionParams, rewriter: &FileRewriter) -> PredictResult<PredictionRequest> {
    let mut input = Map::new();

    for (name, value) in params.ordered_values() {
        if value.is_omitted() {
            continue;
        }

        let json = match value {
            ParamValue::FileRef(path) => Value::String(rewriter.rewrite(&path)?),
            ParamValue::Number(n) => match number_value(n) {
                Some(v) => v,
                None => continue,
            },
            ParamValue::Integer(n) => Value::from(n),
            ParamValue::Text(s) => Value::String(s),
            ParamValue::Unset => continue,
        };

        input.insert(name.to_string(), json);
    }

    Ok(PredictionRequest { input })
}

/// Encode a float, writing whole numbers as JSON integers.
fn number_value(n: f64) -> Option<Value> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return Some(Value::from(n as i64));
    }
    serde_json::Number::from_f64(n).map(Value::Number)
}
