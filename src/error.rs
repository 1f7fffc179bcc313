// ============================================================
// Cross-cutting: Pipeline Errors
// ============================================================
// Every failure the data, ml and infra layers can raise.
// The application and CLI layers wrap these in anyhow with
// extra context; nothing below them sees anyhow.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used by the data, ml and infra layers
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised while preparing data, training, packaging or serving
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("schema error on line {line}: {reason}")]
    Schema { line: usize, reason: String },

    #[error("cannot parse datetime '{0}'")]
    Parse(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("aggregate overflow: {0}")]
    Overflow(String),

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("artifact load error: {0}")]
    ArtifactLoad(String),

    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("deployment error: {0}")]
    Deployment(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PipelineError {
    /// Attach the offending path to an I/O failure
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
