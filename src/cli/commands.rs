// ============================================================
// Layer 1: CLI Commands and Arguments
// ============================================================
// Three subcommands: `prepare`, `train` and `predict`.
//
// Flag defaults mirror TrainConfig::default(), so running
// `audit-forecast train` with no flags trains exactly the
// default configuration.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::{prepare_use_case::PrepareConfig, train_use_case::TrainConfig};
use crate::domain::deployment::InstanceSpec;
use crate::infra::deploy::DeployConfig;
use crate::ml::forest::ForestParams;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read and prepare the audit data without training
    Prepare(PrepareArgs),

    /// Train, score and save a model, optionally deploying it
    Train(TrainArgs),

    /// Send one request body to the models in a directory
    Predict(PredictArgs),
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// NDJSON file of audit records
    #[arg(long, default_value = "file_audit.json")]
    pub input: PathBuf,

    /// Lines decoded per batch
    #[arg(long, default_value_t = 10_000)]
    pub batch_size: usize,

    /// Trailing months held out as the test set
    #[arg(long, default_value_t = 6)]
    pub test_window_months: u32,

    /// Prepared rows to print
    #[arg(long, default_value_t = 5)]
    pub head: usize,
}

impl From<PrepareArgs> for PrepareConfig {
    fn from(a: PrepareArgs) -> Self {
        PrepareConfig {
            input_path:         a.input,
            batch_size:         a.batch_size,
            test_window_months: a.test_window_months,
            head:               a.head,
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// NDJSON file of audit records
    #[arg(long, default_value = "file_audit.json")]
    pub input: PathBuf,

    /// Lines decoded per batch
    #[arg(long, default_value_t = 10_000)]
    pub batch_size: usize,

    /// Trailing months held out as the test set
    #[arg(long, default_value_t = 6)]
    pub test_window_months: u32,

    /// Where `<model-name>_model.json` and run metadata are written
    #[arg(long, default_value = "model")]
    pub artifact_dir: PathBuf,

    #[arg(long, default_value = "records")]
    pub model_name: String,

    /// Trees in the forest
    #[arg(long, default_value_t = 100)]
    pub n_trees: usize,

    /// Seed for bootstrap and feature sampling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Maximum tree depth (unlimited when omitted)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Fewest rows a node needs before it may split
    #[arg(long, default_value_t = 2)]
    pub min_samples_split: usize,

    /// Features tried per split (all when omitted)
    #[arg(long)]
    pub max_features: Option<usize>,

    /// Upload and deploy the trained model, then query it once
    #[arg(long)]
    pub deploy: bool,

    /// Root of the local model registry
    #[arg(long, default_value = "registry")]
    pub registry_dir: PathBuf,

    /// Registry folder uploaded artifacts go under
    #[arg(long, default_value = "forest-model")]
    pub key_prefix: String,

    #[arg(long, default_value = "records-predictor")]
    pub endpoint_name: String,

    #[arg(long, default_value = "ml.t2.medium")]
    pub instance_type: String,

    #[arg(long, default_value_t = 1)]
    pub instance_count: u32,
}

impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            input_path:         a.input,
            batch_size:         a.batch_size,
            test_window_months: a.test_window_months,
            artifact_dir:       a.artifact_dir,
            model_name:         a.model_name,
            forest: ForestParams {
                n_trees:           a.n_trees,
                seed:              a.seed,
                max_depth:         a.max_depth,
                min_samples_split: a.min_samples_split,
                max_features:      a.max_features,
            },
            deploy: a.deploy,
            deployment: DeployConfig {
                registry_dir:  a.registry_dir,
                key_prefix:    a.key_prefix,
                endpoint_name: a.endpoint_name,
            },
            instance: InstanceSpec {
                instance_type:          a.instance_type,
                initial_instance_count: a.instance_count,
            },
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Directory holding one or more `<name>_model.json` files
    #[arg(long, default_value = "model")]
    pub model_dir: PathBuf,

    /// Request body, e.g. '[[2,0,1,true]]'
    #[arg(long, conflicts_with = "body_file", required_unless_present = "body_file")]
    pub body: Option<String>,

    /// Read the request body from a file instead
    #[arg(long)]
    pub body_file: Option<PathBuf>,

    #[arg(long, default_value = "application/json")]
    pub content_type: String,

    #[arg(long, default_value = "application/json")]
    pub accept: String,
}
