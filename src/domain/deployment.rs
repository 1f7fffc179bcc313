// ============================================================
// Layer 3: Deployment Types
// ============================================================
// Values exchanged with a hosting service. They carry no
// behaviour; see traits::ModelHost for the operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where an uploaded artifact lives on the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Host-side key, e.g. `forest-model/records_model.json`
    pub key:  String,
    /// Resolved location in the host's storage
    pub path: PathBuf,
}

/// Compute requested for an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub instance_type:          String,
    pub initial_instance_count: u32,
}

impl Default for InstanceSpec {
    fn default() -> Self {
        Self {
            instance_type:          "ml.t2.medium".to_string(),
            initial_instance_count: 1,
        }
    }
}
