// ============================================================
// Layer 2: PredictUseCase
// ============================================================
// Serves a single request against a model directory, the way a
// hosted endpoint would:
//
//   Step 1: Load every <name>_model.json in the directory
//   Step 2: decode(body) → predict → encode(accept)

use std::path::Path;

use anyhow::{Context, Result};

use crate::ml::inferencer::InferenceHandler;

pub struct PredictUseCase {
    handler: InferenceHandler,
}

impl PredictUseCase {
    pub fn new(model_dir: impl AsRef<Path>) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let handler = InferenceHandler::load(model_dir)
            .with_context(|| format!("Cannot load models from '{}'", model_dir.display()))?;

        tracing::info!("Serving models {:?}", handler.models().names());
        Ok(Self { handler })
    }

    /// Run one request body through the handler and return the
    /// response body as text
    pub fn respond(&self, body: &[u8], content_type: &str, accept: &str) -> Result<String> {
        let response = self.handler.invoke(body, content_type, accept)?;
        String::from_utf8(response).context("Response body is not valid UTF-8")
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::matrix::Matrix;
    use crate::infra::artifact_store::ArtifactStore;
    use crate::ml::forest::{ForestParams, RandomForestRegressor};
    use crate::ml::inferencer::JSON_CONTENT_TYPE;
    use tempfile::tempdir;

    fn save(dir: &Path, name: &str, targets: &[f64]) {
        let x = Matrix::from_rows(vec![
            vec![1.0, 0.0, 1.0, 1.0],
            vec![3.0, 2.0, 1.0, 1.0],
            vec![9.0, 6.0, 1.0, 0.0],
        ])
        .unwrap();
        let params = ForestParams { n_trees: 4, ..ForestParams::default() };
        let forest = RandomForestRegressor::fit(&x, targets, &params).unwrap();
        ArtifactStore::new(dir).save_model(name, &forest).unwrap();
    }

    #[test]
    fn test_one_column_per_model() {
        let tmp = tempdir().unwrap();
        save(tmp.path(), "records", &[10.0, 30.0, 90.0]);
        save(tmp.path(), "files", &[1.0, 3.0, 9.0]);

        let use_case = PredictUseCase::new(tmp.path()).unwrap();
        let text = use_case
            .respond(b"[[3,2,1,true],[9,6,1,false]]", JSON_CONTENT_TYPE, JSON_CONTENT_TYPE)
            .unwrap();

        let rows: Vec<Vec<f64>> = serde_json::from_str(&text).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.len() == 2));
    }

    #[test]
    fn test_empty_model_dir_fails_to_load() {
        let tmp = tempdir().unwrap();
        assert!(PredictUseCase::new(tmp.path()).is_err());
    }

    #[test]
    fn test_wrong_content_type_is_per_request() {
        let tmp = tempdir().unwrap();
        save(tmp.path(), "records", &[10.0, 30.0, 90.0]);
        let use_case = PredictUseCase::new(tmp.path()).unwrap();

        assert!(use_case.respond(b"[[1,0,1,1]]", "text/plain", JSON_CONTENT_TYPE).is_err());
        assert!(use_case.respond(b"[[1,0,1,1]]", JSON_CONTENT_TYPE, JSON_CONTENT_TYPE).is_ok());
    }
}
