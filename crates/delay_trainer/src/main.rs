//! Flight delay batch pipeline CLI
//!
//! Trains the delay classifier and/or scores a CSV batch with it.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use flightdelay_trainer::{predict_csv, train_from_csv, DEFAULT_SEED};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Train,
    Predict,
    Both,
}

#[derive(Parser, Debug)]
#[command(name = "delay-pipeline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and run the flight delay classifier", long_about = None)]
struct Args {
    /// Pipeline stage(s) to run
    #[arg(long, value_enum, default_value = "both")]
    mode: Mode,

    /// Labelled CSV used for training
    #[arg(long)]
    train_data: Option<PathBuf>,

    /// CSV to score (defaults to the training data in `both` mode)
    #[arg(long)]
    predict_data: Option<PathBuf>,

    /// Artifact path (JSON; digest written next to it as `.hash`)
    #[arg(long, default_value = "models/delay_model.json")]
    artifact: PathBuf,

    /// Output CSV for predictions
    #[arg(short, long, default_value = "predictions_output.csv")]
    output: PathBuf,

    /// Seed for the train/test split
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_level.as_str())),
        )
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Flight delay pipeline v{}", env!("CARGO_PKG_VERSION"));

    if matches!(args.mode, Mode::Train | Mode::Both) {
        let Some(train_data) = args.train_data.as_deref() else {
            bail!("--train-data is required for mode {:?}", args.mode);
        };

        info!(path = %train_data.display(), seed = args.seed, "training");
        let outcome = train_from_csv(train_data, &args.artifact, args.seed)
            .context("Training failed")?;

        let metadata = outcome.artifact.metadata();
        info!(
            features = metadata.feature_count,
            train_rows = metadata.train_rows,
            test_rows = metadata.test_rows,
            model_hash = %metadata.model_hash,
            "training complete"
        );
    }

    if matches!(args.mode, Mode::Predict | Mode::Both) {
        let Some(predict_data) = args.predict_data.as_deref().or(args.train_data.as_deref())
        else {
            bail!("--predict-data is required for mode {:?}", args.mode);
        };

        info!(path = %predict_data.display(), artifact = %args.artifact.display(), "predicting");
        let predictions = predict_csv(predict_data, &args.artifact, &args.output)
            .context("Prediction failed")?;

        info!(
            rows = predictions.len(),
            output = %args.output.display(),
            "predictions written"
        );
    }

    Ok(())
}
