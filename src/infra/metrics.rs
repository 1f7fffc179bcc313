// ============================================================
// Layer 6: Evaluation Log
// ============================================================
// Appends one row per training run to a CSV file so runs can be
// compared later.
//
// Output file: <artifact_dir>/metrics.csv
//
//   trained_at,model_name,cutoff,train_rows,test_rows,mse
//   2026-10-18T09:12:44Z,records,2026-03-31,1460,366,5123.402100

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

const HEADER: &str = "trained_at,model_name,cutoff,train_rows,test_rows,mse";

/// Outcome of one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub trained_at: DateTime<Utc>,
    pub model_name: String,
    pub cutoff:     NaiveDate,
    pub train_rows: usize,
    pub test_rows:  usize,
    pub mse:        f64,
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Open (or start) `metrics.csv` in `dir`, writing the header
    /// only when the file is new.
    pub fn new(dir: impl AsRef<Path>) -> PipelineResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path).map_err(|e| PipelineError::io(&csv_path, e))?;
            writeln!(f, "{HEADER}").map_err(|e| PipelineError::io(&csv_path, e))?;
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &RunMetrics) -> PipelineResult<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .map_err(|e| PipelineError::io(&self.csv_path, e))?;

        writeln!(
            f,
            "{},{},{},{},{},{:.6}",
            m.trained_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            m.model_name,
            m.cutoff,
            m.train_rows,
            m.test_rows,
            m.mse,
        )
        .map_err(|e| PipelineError::io(&self.csv_path, e))?;

        tracing::debug!("Logged run metrics for '{}': mse={:.4}", m.model_name, m.mse);
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
