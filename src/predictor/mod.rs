//! The predictor abstraction: this node's local inference capability
//!
//! Deliberately opaque — a single `predict(JSON) -> JSON` capability, the
//! same shape the original implementation's models exposed through plain
//! `model.predict(data)`. What happens inside a predictor (a linear model,
//! a call out to some other process, a lookup table) is none of the
//! overlay's business.

mod linear;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::Result;

pub use linear::{load_from_path, LinearModel};

/// A loaded, callable model.
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, input: Value) -> Result<Value>;
}

/// The set of models this node currently serves locally.
pub struct LocalModels {
    predictors: RwLock<HashMap<String, Arc<dyn Predictor>>>,
}

impl LocalModels {
    pub fn new() -> Self {
        Self {
            predictors: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self, name: impl Into<String>, predictor: Arc<dyn Predictor>) {
        self.predictors.write().insert(name.into(), predictor);
    }

    pub fn unload(&self, name: &str) -> bool {
        self.predictors.write().remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Predictor>> {
        self.predictors.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.predictors.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.predictors.read().keys().cloned().collect()
    }
}

impl Default for LocalModels {
    fn default() -> Self {
        Self::new()
    }
}
