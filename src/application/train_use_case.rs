// ============================================================
// Layer 2: TrainUseCase
// ============================================================
// Runs the full training pipeline in order:
//
//   Step 1: Read audit records            (Layer 4 - data)
//   Step 2: Build (date, cycle) features  (Layer 4 - data)
//   Step 3: Chronological split           (Layer 4 - data)
//   Step 4: Fit the forest                (Layer 5 - ml)
//   Step 5: Score on held-out months      (Layer 5 - ml)
//   Step 6: Log run metrics               (Layer 6 - infra)
//   Step 7: Save model + config           (Layer 6 - infra)
//   Step 8: Upload, deploy, smoke-test    (Layer 6 - infra, optional)
//
// Any failure aborts the run. No step is retried.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::data::{
    features::FeatureBuilder,
    loader::{JsonlLoader, DEFAULT_BATCH_SIZE},
    splitter::{split_by_months, DEFAULT_TEST_WINDOW_MONTHS},
};
use crate::domain::deployment::InstanceSpec;
use crate::domain::traits::{Endpoint, ModelHost, RecordSource};
use crate::infra::{
    artifact_store::ArtifactStore,
    deploy::{DeployConfig, LocalModelHost},
    metrics::{MetricsLogger, RunMetrics},
};
use crate::ml::forest::ForestParams;
use crate::ml::trainer::{evaluate, feature_matrix, train};

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything one training run needs. Saved next to the model as
// train_config.json so a served model can be traced to its run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub input_path:         PathBuf,
    pub batch_size:         usize,
    pub test_window_months: u32,
    pub artifact_dir:       PathBuf,
    pub model_name:         String,
    pub forest:             ForestParams,
    pub deploy:             bool,
    pub deployment:         DeployConfig,
    pub instance:           InstanceSpec,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            input_path:         PathBuf::from("file_audit.json"),
            batch_size:         DEFAULT_BATCH_SIZE,
            test_window_months: DEFAULT_TEST_WINDOW_MONTHS,
            artifact_dir:       PathBuf::from("model"),
            model_name:         "records".to_string(),
            forest:             ForestParams::default(),
            deploy:             false,
            deployment:         DeployConfig::default(),
            instance:           InstanceSpec::default(),
        }
    }
}

/// What the endpoint said about the first held-out row
#[derive(Debug, Clone)]
pub struct SmokeTest {
    pub endpoint:    String,
    /// Where the endpoint serves its model from
    pub served_from: PathBuf,
    pub prediction:  Vec<f64>,
    pub actual:      u64,
}

/// Summary of a finished run, for the CLI to print
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub records:       usize,
    pub prepared_rows: usize,
    pub cutoff:        NaiveDate,
    pub train_rows:    usize,
    pub test_rows:     usize,
    pub mse:           f64,
    pub artifact_path: PathBuf,
    pub smoke_test:    Option<SmokeTest>,
}

pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainOutcome> {
        self.execute_with(&FeatureBuilder::for_today())
    }

    /// Same as `execute`, anchored to the given feature builder's year
    pub fn execute_with(&self, builder: &FeatureBuilder) -> Result<TrainOutcome> {
        let cfg = &self.config;

        // ── Step 1: Read raw records ──────────────────────────────────────────
        let loader = JsonlLoader::new(&cfg.input_path).with_batch_size(cfg.batch_size);
        let records = loader
            .load_all()
            .with_context(|| format!("Cannot read audit records from '{}'", cfg.input_path.display()))?;

        // ── Step 2: Aggregate into prepared rows ──────────────────────────────
        let prepared = builder.build(&records).context("Feature preparation failed")?;
        let prepared_rows = prepared.len();

        // ── Step 3: Hold out the trailing months ──────────────────────────────
        let split = split_by_months(prepared, cfg.test_window_months)?;
        tracing::info!(
            "Split at {}: {} train, {} test",
            split.cutoff,
            split.train.len(),
            split.test.len()
        );

        // ── Step 4: Fit ───────────────────────────────────────────────────────
        let model = train(&split.train, &cfg.forest)?;

        // ── Step 5: Score ─────────────────────────────────────────────────────
        let evaluation = evaluate(&model, &split.test)?;
        tracing::info!("Mean squared error on {} test rows: {}", evaluation.rows, evaluation.mse);

        // ── Step 6: Metrics ───────────────────────────────────────────────────
        let metrics = RunMetrics {
            trained_at: Utc::now(),
            model_name: cfg.model_name.clone(),
            cutoff:     split.cutoff,
            train_rows: split.train.len(),
            test_rows:  split.test.len(),
            mse:        evaluation.mse,
        };
        MetricsLogger::new(&cfg.artifact_dir)?.log(&metrics)?;

        // ── Step 7: Package ───────────────────────────────────────────────────
        let store = ArtifactStore::new(&cfg.artifact_dir);
        let artifact_path = store.save_model(&cfg.model_name, &model)?;
        store.save_config(cfg)?;

        // ── Step 8: Optional hand-off to the model host ───────────────────────
        let smoke_test = if cfg.deploy {
            let host = LocalModelHost::new(cfg.deployment.clone());
            let artifact = host.upload(&artifact_path).context("Upload failed")?;
            let endpoint = host.deploy(&artifact, &cfg.instance).context("Deployment failed")?;

            // First held-out row, same as a client would send it
            let probe = &split.test[..1];
            let response = endpoint.predict(&feature_matrix(probe)?)?;
            let prediction = response.row(0).map(<[f64]>::to_vec).unwrap_or_default();

            Some(SmokeTest {
                endpoint:    endpoint.name().to_string(),
                served_from: endpoint.dir().to_path_buf(),
                prediction,
                actual:      probe[0].total_records,
            })
        } else {
            None
        };

        Ok(TrainOutcome {
            records: records.len(),
            prepared_rows,
            cutoff: split.cutoff,
            train_rows: split.train.len(),
            test_rows: split.test.len(),
            mse: evaluation.mse,
            artifact_path,
            smoke_test,
        })
    }
}
