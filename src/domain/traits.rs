// ============================================================
// Layer 3: Core Traits
// ============================================================
// The seams between layers. The application layer only talks
// to these, so a loader, a model or a hosting service can be
// swapped (or replaced by a test double) without touching it.

use std::path::Path;

use crate::domain::deployment::{ArtifactRef, InstanceSpec};
use crate::domain::matrix::{FeatureMatrix, PredictionMatrix};
use crate::domain::record::RawRecord;
use crate::error::PipelineResult;

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Anything that can produce the full, ordered raw record dataset.
///
/// Implementations:
///   - JsonlLoader → newline-delimited JSON file read in batches
pub trait RecordSource {
    fn load_all(&self) -> PipelineResult<Vec<RawRecord>>;
}

// ─── Regressor ────────────────────────────────────────────────────────────────
/// A fitted model. The only thing anyone may do with it is predict.
///
/// `Send + Sync` because a loaded ModelSet is shared read-only
/// between concurrent requests.
pub trait Regressor: Send + Sync {
    /// One prediction per input row
    fn predict(&self, features: &FeatureMatrix) -> PipelineResult<Vec<f64>>;
}

// ─── ModelHost / Endpoint ─────────────────────────────────────────────────────
/// A managed hosting service: receives an artifact, stands up an
/// endpoint that serves it.
pub trait ModelHost {
    type Endpoint: Endpoint;

    /// Push a local artifact file to the host's storage
    fn upload(&self, local_path: &Path) -> PipelineResult<ArtifactRef>;

    /// Create a prediction endpoint serving a previously uploaded artifact
    fn deploy(&self, artifact: &ArtifactRef, spec: &InstanceSpec) -> PipelineResult<Self::Endpoint>;
}

/// A live prediction endpoint.
pub trait Endpoint {
    fn name(&self) -> &str;

    /// One row per input row, one column per model behind the endpoint
    fn predict(&self, features: &FeatureMatrix) -> PipelineResult<PredictionMatrix>;
}
