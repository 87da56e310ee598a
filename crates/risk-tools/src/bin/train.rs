//! risk-train
//!
//! Fits the risk model and writes the artifact the engine loads at start.
//!
//! - `RISK_DATASET_PATH`: training CSV; the synthetic reference cohort is
//!   used when unset
//! - `RISK_MODEL_PATH`: where the artifact is written

use anyhow::Context;
use diabetes_risk::dataset::{synthetic_cohort, COHORT_SIZE};
use diabetes_risk::{Dataset, EngineConfig, ModelTrainer, TrainerConfig};

fn main() -> anyhow::Result<()> {
    risk_tools::init();

    let engine_config = EngineConfig::from_env()?;
    let trainer_config = TrainerConfig::from_env()?;

    let dataset = match std::env::var("RISK_DATASET_PATH").ok().filter(|p| !p.trim().is_empty()) {
        Some(path) => {
            tracing::info!("Loading training data from {path}");
            Dataset::from_csv_path(&path).with_context(|| format!("failed to load dataset {path}"))?
        }
        None => {
            tracing::info!("RISK_DATASET_PATH not set, using the synthetic reference cohort");
            synthetic_cohort(COHORT_SIZE, trainer_config.seed)
        }
    };
    tracing::info!(
        rows = dataset.len(),
        positives = dataset.positives(),
        "Dataset ready"
    );

    let trainer = ModelTrainer::new(trainer_config);
    let report = trainer
        .train_and_persist(&dataset, &engine_config.model_path)
        .context("training failed, no artifact was written")?;

    tracing::info!("✓ Model written to {}", engine_config.model_path.display());
    for (feature, importance) in &report.importances {
        tracing::info!("  {:<16} {:>6.1}%", feature.label(), importance * 100.0);
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
