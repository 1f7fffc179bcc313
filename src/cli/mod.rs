// ============================================================
// Layer 1: CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and hands off to Layer 2.
// This is the only layer that prints to stdout.
//
//   prepare : read + feature-build + split, print a summary
//   train   : full pipeline, print MSE and the artifact path
//   predict : one request against a model directory

pub mod commands;

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, PredictArgs, PrepareArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "audit-forecast",
    version,
    about = "Forecast file-audit record volumes with a random forest."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Prepare(args) => run_prepare(args),
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    use crate::application::prepare_use_case::PrepareUseCase;
    use crate::domain::prepared_row::{FEATURE_NAMES, TARGET_NAME};

    tracing::info!("Preparing records from {}", args.input.display());
    let summary = PrepareUseCase::new(args.into()).execute()?;

    println!("Records read:   {}", summary.records);
    println!("Prepared rows:  {}", summary.prepared_rows);
    for row in &summary.head {
        println!("  {row}");
    }
    println!("Features:       {:?} -> {}", FEATURE_NAMES, TARGET_NAME);
    println!("Cutoff:         {}", summary.cutoff);
    println!("Train shape:    {:?}", summary.train_shape);
    println!("Test shape:     {:?}", summary.test_shape);
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on {}", args.input.display());
    let outcome = TrainUseCase::new(args.into()).execute()?;

    println!("Mean Squared Error: {}", outcome.mse);
    println!("Model saved to {}", outcome.artifact_path.display());

    if let Some(smoke) = outcome.smoke_test {
        println!("Endpoint '{}' deployed from {}", smoke.endpoint, smoke.served_from.display());
        println!("Prediction: {:?}", smoke.prediction);
        println!("Actual:     {}", smoke.actual);
    }
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let body = match (args.body, args.body_file) {
        (Some(body), _) => body.into_bytes(),
        (None, Some(path)) => fs::read(&path)
            .with_context(|| format!("Cannot read request body from '{}'", path.display()))?,
        (None, None) => anyhow::bail!("one of --body or --body-file is required"),
    };

    let use_case = PredictUseCase::new(&args.model_dir)?;
    let response = use_case.respond(&body, &args.content_type, &args.accept)?;
    println!("{response}");
    Ok(())
}
