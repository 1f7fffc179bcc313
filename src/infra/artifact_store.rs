// ============================================================
// Layer 6: Artifact Store
// ============================================================
// Saves fitted models and the run configuration to a directory,
// and finds them again at serving time.
//
// File naming convention:
//   model/
//     records_model.json   ← forest named "records"
//     other_model.json     ← forest named "other"
//     train_config.json    ← TrainConfig of the run that wrote them
//     metrics.csv          ← evaluation log (see metrics.rs)
//
// Only files ending in `_model.json` are models. Stripping that
// suffix gives the model name back; everything else in the
// directory is ignored by the scan.

use std::fs;
use std::path::{Path, PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::ml::forest::RandomForestRegressor;

/// Appended to a model name to form its file name
pub const MODEL_SUFFIX: &str = "_model.json";

const CONFIG_FILE: &str = "train_config.json";

/// Model artifacts for one directory
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    /// Where the model called `name` lives
    pub fn model_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}{MODEL_SUFFIX}"))
    }

    /// Serialise a fitted forest as `<name>_model.json`.
    /// Creates the directory if needed.
    pub fn save_model(&self, name: &str, model: &RandomForestRegressor) -> PipelineResult<PathBuf> {
        if !is_plain_name(name) {
            return Err(PipelineError::InvalidConfig(format!("invalid model name '{name}'")));
        }
        self.ensure_dir()?;

        let path = self.model_path(name);
        let json = serde_json::to_vec(model)?;
        fs::write(&path, json).map_err(|e| PipelineError::io(&path, e))?;

        tracing::info!("Saved model '{}' to '{}'", name, path.display());
        Ok(path)
    }

    /// Read one serialised forest back
    pub fn load_model(path: &Path) -> PipelineResult<RandomForestRegressor> {
        let bytes = fs::read(path)
            .map_err(|e| PipelineError::ArtifactLoad(format!("cannot read '{}': {e}", path.display())))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| PipelineError::ArtifactLoad(format!("corrupt artifact '{}': {e}", path.display())))
    }

    /// Every `(name, path)` pair in the directory, sorted by name
    pub fn model_entries(&self) -> PipelineResult<Vec<(String, PathBuf)>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            PipelineError::ArtifactLoad(format!("cannot read model directory '{}': {e}", self.dir.display()))
        })?;

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PipelineError::ArtifactLoad(e.to_string()))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(name) = artifact_name(file_name) {
                found.push((name.to_string(), path.clone()));
            }
        }

        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }

    /// Write the run configuration next to the models
    pub fn save_config(&self, cfg: &TrainConfig) -> PipelineResult<()> {
        self.ensure_dir()?;
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json).map_err(|e| PipelineError::io(&path, e))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    fn ensure_dir(&self) -> PipelineResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| PipelineError::io(&self.dir, e))
    }
}

/// True if `name` can be used as a single path component: non-empty,
/// not `.` or `..`, and free of path separators
pub fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// `"records_model.json"` → `Some("records")`; anything else → `None`
pub fn artifact_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_suffix(MODEL_SUFFIX)
        .filter(|name| !name.is_empty())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::matrix::Matrix;
    use crate::domain::traits::Regressor;
    use crate::ml::forest::ForestParams;
    use tempfile::tempdir;

    fn tiny_forest() -> RandomForestRegressor {
        let x = Matrix::from_rows(vec![vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        let params = ForestParams { n_trees: 3, ..ForestParams::default() };
        RandomForestRegressor::fit(&x, &[10.0, 20.0, 30.0], &params).unwrap()
    }

    #[test]
    fn test_artifact_name() {
        assert_eq!(artifact_name("records_model.json"), Some("records"));
        assert_eq!(artifact_name("a_b_model.json"), Some("a_b"));
        assert_eq!(artifact_name("_model.json"), None);
        assert_eq!(artifact_name("train_config.json"), None);
        assert_eq!(artifact_name("records_model.json.bak"), None);
    }

    #[test]
    fn test_save_creates_dir_and_round_trips() {
        let tmp = tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path().join("nested/model"));
        let forest = tiny_forest();

        let path = store.save_model("records", &forest).unwrap();
        assert!(path.ends_with("records_model.json"));

        let back = ArtifactStore::load_model(&path).unwrap();
        let probe = Matrix::from_rows(vec![vec![2.0]]).unwrap();
        assert_eq!(back.predict(&probe).unwrap(), forest.predict(&probe).unwrap());
    }

    #[test]
    fn test_entries_sorted_and_filtered() {
        let tmp = tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let forest = tiny_forest();
        store.save_model("zeta", &forest).unwrap();
        store.save_model("alpha", &forest).unwrap();
        store.save_config(&TrainConfig::default()).unwrap();
        fs::write(tmp.path().join("notes.txt"), "hi").unwrap();

        let names: Vec<String> = store.model_entries().unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["alpha", "zeta"]);
    }

    #[test]
    fn test_config_round_trip() {
        let tmp = tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let cfg = TrainConfig { model_name: "weekly".into(), ..TrainConfig::default() };
        store.save_config(&cfg).unwrap();

        let json = fs::read_to_string(tmp.path().join(CONFIG_FILE)).unwrap();
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.model_name, "weekly");
    }

    #[test]
    fn test_is_plain_name() {
        assert!(is_plain_name("records"));
        assert!(is_plain_name("forest-model"));
        for bad in ["", ".", "..", "a/b", "..\\x"] {
            assert!(!is_plain_name(bad), "{bad:?}");
        }
    }

    #[test]
    fn test_rejects_path_in_name() {
        let tmp = tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let err = store.save_model("../escape", &tiny_forest()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }

    #[test]
    fn test_corrupt_artifact() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("bad_model.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(matches!(ArtifactStore::load_model(&path), Err(PipelineError::ArtifactLoad(_))));
    }
}
