// ============================================================
// Layer 2: PrepareUseCase
// ============================================================
// The data-preparation half of training, with no model at the end.
// Useful for eyeballing what the forest will be fed:
//
//   JsonlLoader → FeatureBuilder → split_by_months → PrepareSummary

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::{
    features::FeatureBuilder,
    loader::{JsonlLoader, DEFAULT_BATCH_SIZE},
    splitter::{split_by_months, DEFAULT_TEST_WINDOW_MONTHS},
};
use crate::domain::prepared_row::{PreparedRow, FEATURE_NAMES};
use crate::domain::traits::RecordSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepareConfig {
    pub input_path:         PathBuf,
    pub batch_size:         usize,
    pub test_window_months: u32,
    /// How many prepared rows to keep for display
    pub head:               usize,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            input_path:         PathBuf::from("file_audit.json"),
            batch_size:         DEFAULT_BATCH_SIZE,
            test_window_months: DEFAULT_TEST_WINDOW_MONTHS,
            head:               5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrepareSummary {
    pub records:       usize,
    pub prepared_rows: usize,
    pub head:          Vec<PreparedRow>,
    pub cutoff:        NaiveDate,
    /// (rows, columns) of the training feature matrix
    pub train_shape:   (usize, usize),
    pub test_shape:    (usize, usize),
}

pub struct PrepareUseCase {
    config: PrepareConfig,
}

impl PrepareUseCase {
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<PrepareSummary> {
        self.execute_with(&FeatureBuilder::for_today())
    }

    pub fn execute_with(&self, builder: &FeatureBuilder) -> Result<PrepareSummary> {
        let cfg = &self.config;

        let records = JsonlLoader::new(&cfg.input_path)
            .with_batch_size(cfg.batch_size)
            .load_all()
            .with_context(|| format!("Cannot read audit records from '{}'", cfg.input_path.display()))?;
        tracing::info!("Loaded {} records", records.len());

        let prepared = builder.build(&records).context("Feature preparation failed")?;
        let prepared_rows = prepared.len();
        let head = prepared.iter().take(cfg.head).cloned().collect();

        let split = split_by_months(prepared, cfg.test_window_months)?;
        let width = FEATURE_NAMES.len();

        Ok(PrepareSummary {
            records: records.len(),
            prepared_rows,
            head,
            cutoff: split.cutoff,
            train_shape: (split.train.len(), width),
            test_shape: (split.test.len(), width),
        })
    }
}
