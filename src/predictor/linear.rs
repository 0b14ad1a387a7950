//! A bundled, dependency-free reference predictor
//!
//! The original implementation's `load_model_from_path` unpickled a local
//! file into a Python object with a `.predict()` method — convenient in
//! Python, but pickle has no equivalent here and no equivalent should be
//! invented. What we keep is the *shape* of that loader: a small model
//! description sitting in a file on disk, loaded by name at startup.
//!
//! The format is a JSON document with two fields:
//!
//! ```json
//! { "weights": [0.5, -0.25, 1.0], "bias": 0.1 }
//! ```
//!
//! Input is either a bare JSON array of the same length as `weights`, or an
//! object `{"features": [...]}`. The prediction is the dot product plus
//! bias, returned as `{"prediction": <number>}`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::predictor::Predictor;

#[derive(Debug, Deserialize)]
struct LinearModelFile {
    weights: Vec<f64>,
    bias: f64,
}

/// A linear model: `prediction = weights . features + bias`.
#[derive(Debug, Clone)]
pub struct LinearModel {
    weights: Vec<f64>,
    bias: f64,
}

impl LinearModel {
    pub fn new(weights: Vec<f64>, bias: f64) -> Self {
        Self { weights, bias }
    }

    fn extract_features(&self, input: &Value) -> Result<Vec<f64>> {
        let raw = match input {
            Value::Array(items) => items,
            Value::Object(map) => map
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    Error::inference("input object must contain a 'features' array")
                })?,
            _ => {
                return Err(Error::inference(
                    "input must be a JSON array or an object with a 'features' array",
                ))
            }
        };

        if raw.len() != self.weights.len() {
            return Err(Error::inference(format!(
                "expected {} features, got {}",
                self.weights.len(),
                raw.len()
            )));
        }

        raw.iter()
            .map(|v| {
                v.as_f64()
                    .ok_or_else(|| Error::inference("feature values must be numbers"))
            })
            .collect()
    }
}

#[async_trait]
impl Predictor for LinearModel {
    async fn predict(&self, input: Value) -> Result<Value> {
        let features = self.extract_features(&input)?;
        let dot: f64 = features
            .iter()
            .zip(&self.weights)
            .map(|(f, w)| f * w)
            .sum();
        Ok(serde_json::json!({ "prediction": dot + self.bias }))
    }
}

/// Load a [`LinearModel`] from a JSON file on disk.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<LinearModel> {
    let path: PathBuf = path.as_ref().to_path_buf();
    if !path.exists() {
        return Err(Error::LoaderNotFound(path));
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| Error::IoRead {
        path: path.clone(),
        source: e,
    })?;
    let parsed: LinearModelFile = serde_json::from_str(&contents)
        .map_err(|e| Error::loader_parse(path.clone(), e.to_string()))?;
    if parsed.weights.is_empty() {
        return Err(Error::loader_parse(path, "weights must not be empty"));
    }
    Ok(LinearModel::new(parsed.weights, parsed.bias))
}
