// ============================================================
// Layer 6: Local Model Host
// ============================================================
// A filesystem-backed stand-in for a managed hosting service.
// It follows the same upload → deploy → predict contract a cloud
// host does, so the training workflow only ever sees the
// ModelHost / Endpoint traits.
//
// Layout under the registry directory:
//
//   registry/
//     forest-model/
//       records_model.json        ← upload()
//     endpoints/
//       records-predictor/
//         records_model.json      ← deploy() copies the artifact here
//         endpoint.json           ← name, artifact key, instance spec
//
// An endpoint serves its directory through an InferenceHandler,
// and predict() goes through the JSON wire format like a remote
// client would.
//
// Configuration is passed in explicitly via DeployConfig; nothing
// here reads process-wide state.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::deployment::{ArtifactRef, InstanceSpec};
use crate::domain::matrix::{FeatureMatrix, Matrix, PredictionMatrix};
use crate::domain::traits::{Endpoint, ModelHost};
use crate::error::{PipelineError, PipelineResult};
use crate::infra::artifact_store::{artifact_name, is_plain_name};
use crate::ml::inferencer::{InferenceHandler, JSON_CONTENT_TYPE};

const DESCRIPTOR_FILE: &str = "endpoint.json";

/// Where and under which names artifacts and endpoints are kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    pub registry_dir:  PathBuf,
    pub key_prefix:    String,
    pub endpoint_name: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            registry_dir:  PathBuf::from("registry"),
            key_prefix:    "forest-model".to_string(),
            endpoint_name: "records-predictor".to_string(),
        }
    }
}

/// Written next to a deployed artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    pub name:       String,
    pub artifact:   ArtifactRef,
    pub instance:   InstanceSpec,
    pub created_at: DateTime<Utc>,
}

pub struct LocalModelHost {
    cfg: DeployConfig,
}

impl LocalModelHost {
    pub fn new(cfg: DeployConfig) -> Self {
        Self { cfg }
    }

    fn endpoint_dir(&self) -> PipelineResult<PathBuf> {
        let name = plain("endpoint name", &self.cfg.endpoint_name)?;
        Ok(self.cfg.registry_dir.join("endpoints").join(name))
    }
}

/// Names become directories under the registry, and an endpoint
/// directory is removed on redeploy, so both must stay one level deep
fn plain<'a>(what: &str, name: &'a str) -> PipelineResult<&'a str> {
    if is_plain_name(name) {
        Ok(name)
    } else {
        Err(PipelineError::Deployment(format!("invalid {what} '{name}'")))
    }
}

fn file_name_of(path: &Path) -> PipelineResult<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PipelineError::Deployment(format!("'{}' has no usable file name", path.display())))
}

impl ModelHost for LocalModelHost {
    type Endpoint = LocalEndpoint;

    fn upload(&self, local_path: &Path) -> PipelineResult<ArtifactRef> {
        let file_name = file_name_of(local_path)?;
        let prefix = plain("key prefix", &self.cfg.key_prefix)?;
        let dest_dir = self.cfg.registry_dir.join(prefix);
        fs::create_dir_all(&dest_dir).map_err(|e| PipelineError::io(&dest_dir, e))?;

        let dest = dest_dir.join(file_name);
        fs::copy(local_path, &dest).map_err(|e| PipelineError::io(local_path, e))?;

        let artifact = ArtifactRef {
            key:  format!("{}/{}", self.cfg.key_prefix, file_name),
            path: dest,
        };
        tracing::info!("Uploaded '{}' as '{}'", local_path.display(), artifact.key);
        Ok(artifact)
    }

    fn deploy(&self, artifact: &ArtifactRef, spec: &InstanceSpec) -> PipelineResult<LocalEndpoint> {
        if spec.initial_instance_count == 0 {
            return Err(PipelineError::Deployment("initial instance count must be at least 1".into()));
        }
        if spec.instance_type.trim().is_empty() {
            return Err(PipelineError::Deployment("instance type must not be empty".into()));
        }

        // The endpoint only loads `<name>_model.json` files, so an
        // artifact under any other name would serve nothing
        let file_name = file_name_of(&artifact.path)?;
        if artifact_name(file_name).is_none() {
            return Err(PipelineError::Deployment(format!(
                "artifact '{file_name}' does not follow the <name>_model.json convention"
            )));
        }

        let dir = self.endpoint_dir()?;
        if dir.exists() {
            tracing::warn!("Replacing existing endpoint '{}'", self.cfg.endpoint_name);
            fs::remove_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;
        }
        fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;
        fs::copy(&artifact.path, dir.join(file_name)).map_err(|e| PipelineError::io(&artifact.path, e))?;

        let descriptor = EndpointDescriptor {
            name:       self.cfg.endpoint_name.clone(),
            artifact:   artifact.clone(),
            instance:   spec.clone(),
            created_at: Utc::now(),
        };
        let descriptor_path = dir.join(DESCRIPTOR_FILE);
        fs::write(&descriptor_path, serde_json::to_string_pretty(&descriptor)?)
            .map_err(|e| PipelineError::io(&descriptor_path, e))?;

        let handler = InferenceHandler::load(&dir)?;
        tracing::info!(
            "Endpoint '{}' up on {} x {} serving {:?}",
            descriptor.name,
            spec.initial_instance_count,
            spec.instance_type,
            handler.models().names()
        );

        Ok(LocalEndpoint { name: descriptor.name, dir, handler })
    }
}

#[derive(Debug)]
pub struct LocalEndpoint {
    name:    String,
    dir:     PathBuf,
    handler: InferenceHandler,
}

impl LocalEndpoint {
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Endpoint for LocalEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &FeatureMatrix) -> PipelineResult<PredictionMatrix> {
        let body = serde_json::to_vec(features)?;
        let response = self.handler.invoke(&body, JSON_CONTENT_TYPE, JSON_CONTENT_TYPE)?;
        let rows: Vec<Vec<f64>> = serde_json::from_slice(&response)?;
        Matrix::from_rows(rows)
    }
}
