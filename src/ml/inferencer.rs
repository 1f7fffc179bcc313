// ============================================================
// Layer 5: Inference Adapter
// ============================================================
// The four hooks a serving runtime calls:
//
//   ModelSet::load(dir)          once per process
//   decode(body, content_type)   per request → FeatureMatrix
//   predict(&features, &models)  per request → PredictionMatrix
//   encode(&predictions, accept) per request → response bytes
//
// The ModelSet is never mutated after load. A failed request
// leaves it untouched, and it can be shared across threads as-is
// (every Regressor is Send + Sync).
//
// Output columns follow model name order (BTreeMap), so the
// response layout is the same on every run.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde_json::Value;

use crate::domain::matrix::{FeatureMatrix, Matrix, PredictionMatrix};
use crate::domain::traits::Regressor;
use crate::error::{PipelineError, PipelineResult};
use crate::infra::artifact_store::ArtifactStore;

/// The only media type accepted for requests and responses
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Immutable name → model mapping built once at startup
pub struct ModelSet {
    models: BTreeMap<String, Box<dyn Regressor>>,
}

impl ModelSet {
    /// Load every `<name>_model.json` in `dir`.
    /// An unreadable directory, a corrupt file, or an empty
    /// directory are all load failures.
    pub fn load(dir: impl AsRef<Path>) -> PipelineResult<Self> {
        let store = ArtifactStore::new(dir.as_ref());
        let mut loaded: Vec<(String, Box<dyn Regressor>)> = Vec::new();

        for (name, path) in store.model_entries()? {
            let forest = ArtifactStore::load_model(&path)?;
            tracing::info!(
                "Loaded model '{}' ({} trees, {} features, seed {})",
                name,
                forest.n_trees(),
                forest.n_features(),
                forest.params().seed
            );
            let model: Box<dyn Regressor> = Box::new(forest);
            loaded.push((name, model));
        }

        let set = Self::from_models(loaded)?;
        if set.is_empty() {
            return Err(PipelineError::ArtifactLoad(format!(
                "no *_model.json artifacts in '{}'",
                dir.as_ref().display()
            )));
        }
        Ok(set)
    }

    /// Build from already-constructed models. Duplicate names are rejected.
    pub fn from_models(
        models: impl IntoIterator<Item = (String, Box<dyn Regressor>)>,
    ) -> PipelineResult<Self> {
        let mut map = BTreeMap::new();
        for (name, model) in models {
            if map.insert(name.clone(), model).is_some() {
                return Err(PipelineError::ArtifactLoad(format!("duplicate model name '{name}'")));
            }
        }
        Ok(Self { models: map })
    }

    /// Column order of every prediction matrix
    pub fn names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl fmt::Debug for ModelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSet").field("names", &self.names()).finish()
    }
}

/// True for `application/json`, ignoring case and parameters
/// such as `; charset=utf-8`
fn is_json(media_type: &str) -> bool {
    media_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(JSON_CONTENT_TYPE))
}

/// Parse a request body into feature rows.
///
/// Accepts `[[..], [..]]` (one inner array per row) or a flat
/// `[..]` (a single row). Cells may be numbers or booleans.
pub fn decode(body: &[u8], content_type: &str) -> PipelineResult<FeatureMatrix> {
    if !is_json(content_type) {
        return Err(PipelineError::UnsupportedMediaType(format!("content type '{content_type}'")));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| PipelineError::Decode(format!("request body is not JSON: {e}")))?;

    let Value::Array(items) = value else {
        return Err(PipelineError::Decode("request body must be a JSON array".into()));
    };

    let rows = if items.iter().all(|v| !v.is_array()) && !items.is_empty() {
        vec![numeric_row(&items, 0)?]
    } else {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Array(cells) => numeric_row(cells, i),
                _ => Err(PipelineError::Decode(format!("row {i} is not an array"))),
            })
            .collect::<PipelineResult<Vec<_>>>()?
    };

    Matrix::from_rows(rows).map_err(|e| PipelineError::Decode(e.to_string()))
}

fn numeric_row(cells: &[Value], row: usize) -> PipelineResult<Vec<f64>> {
    cells
        .iter()
        .enumerate()
        .map(|(col, cell)| match cell {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| PipelineError::Decode(format!("cell [{row}][{col}] out of range"))),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            other => Err(PipelineError::Decode(format!("cell [{row}][{col}] is not numeric: {other}"))),
        })
        .collect()
}

/// Run every model; one output column per model in name order.
pub fn predict(features: &FeatureMatrix, models: &ModelSet) -> PipelineResult<PredictionMatrix> {
    let columns = models
        .models
        .iter()
        .map(|(name, model)| {
            let column = model.predict(features)?;
            if column.len() != features.n_rows() {
                return Err(PipelineError::Shape(format!(
                    "model '{name}' returned {} predictions for {} rows",
                    column.len(),
                    features.n_rows()
                )));
            }
            Ok(column)
        })
        .collect::<PipelineResult<Vec<_>>>()?;

    Matrix::from_columns(&columns, features.n_rows())
}

/// Serialise predictions as nested JSON arrays.
///
/// Whole numbers are written as JSON integers (`3`, not `3.0`), so an
/// integer request echoed back by an identity model is unchanged.
pub fn encode(predictions: &PredictionMatrix, accept: &str) -> PipelineResult<Vec<u8>> {
    if !is_json(accept) {
        return Err(PipelineError::UnsupportedMediaType(format!("accept type '{accept}'")));
    }

    let rows: Vec<Value> = predictions
        .rows()
        .iter()
        .map(|row| Value::Array(row.iter().copied().map(json_number).collect()))
        .collect();
    Ok(serde_json::to_vec(&Value::Array(rows))?)
}

/// Integers up to 2^53 are exact in f64
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

fn json_number(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() <= MAX_EXACT_INT {
        Value::from(v as i64)
    } else {
        // NaN and infinities become null
        Value::from(v)
    }
}

/// A loaded ModelSet plus the per-request pipeline over it.
#[derive(Debug)]
pub struct InferenceHandler {
    models: ModelSet,
}

impl InferenceHandler {
    pub fn new(models: ModelSet) -> Self {
        Self { models }
    }

    pub fn load(model_dir: impl AsRef<Path>) -> PipelineResult<Self> {
        Ok(Self::new(ModelSet::load(model_dir)?))
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    /// decode → predict → encode for a single request
    pub fn invoke(&self, body: &[u8], content_type: &str, accept: &str) -> PipelineResult<Vec<u8>> {
        let features = decode(body, content_type)?;
        let predictions = predict(&features, &self.models)?;
        tracing::debug!(
            "Served {} rows x {} models",
            predictions.n_rows(),
            self.models.len()
        );
        encode(&predictions, accept)
    }
}
