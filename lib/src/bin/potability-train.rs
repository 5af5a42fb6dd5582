//! Fit the potability pipeline on a labeled CSV and write the artifact.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p potability --bin potability-train --release -- \
//!     --dataset df/water_potability.csv --output improved_xgboost_model.bin
//! ```

use anyhow::Context;
use clap::Parser;
use potability::dataset::LabeledDataset;
use potability::model::BoostingConfig;
use potability::trainer::{Trainer, TrainerConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Train the water potability classifier.
#[derive(Parser, Debug)]
#[command(name = "potability-train", version)]
#[command(about = "Fit impute → scale → gradient boosting on a labeled water quality CSV")]
struct Args {
    /// Labeled CSV with the nine feature columns and `Potability`
    #[arg(long, env = "POTABILITY_DATASET", default_value = "df/water_potability.csv")]
    dataset: PathBuf,

    /// Where to write the fitted pipeline
    #[arg(short, long, env = "POTABILITY_OUTPUT", default_value = "improved_xgboost_model.bin")]
    output: PathBuf,

    /// Seed of the train/holdout split
    #[arg(long, env = "POTABILITY_SEED", default_value_t = 42)]
    seed: u64,

    /// Fraction of rows held out for evaluation
    #[arg(long, env = "POTABILITY_TEST_SIZE", default_value_t = 0.2)]
    test_size: f64,

    /// Number of boosted trees
    #[arg(long, env = "POTABILITY_N_ESTIMATORS", default_value_t = 100)]
    n_estimators: usize,

    /// Maximum depth of each tree
    #[arg(long, env = "POTABILITY_MAX_DEPTH", default_value_t = 3)]
    max_depth: usize,

    /// Shrinkage applied to each tree
    #[arg(long, env = "POTABILITY_LEARNING_RATE", default_value_t = 0.3)]
    learning_rate: f64,
}

impl Args {
    fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            test_size: self.test_size,
            seed: self.seed,
            boosting: BoostingConfig {
                n_estimators: self.n_estimators,
                max_depth: self.max_depth,
                learning_rate: self.learning_rate,
                ..BoostingConfig::default()
            },
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("potability-train v{}", env!("CARGO_PKG_VERSION"));

    let dataset = LabeledDataset::from_csv_path(&args.dataset)
        .with_context(|| format!("loading dataset {}", args.dataset.display()))?;

    let outcome = Trainer::new(args.trainer_config())
        .fit(&dataset)
        .context("training failed")?;

    outcome
        .pipeline
        .save(&args.output)
        .with_context(|| format!("writing artifact {}", args.output.display()))?;

    let report = &outcome.report;
    info!(
        output = %args.output.display(),
        n_train = report.n_train,
        n_test = report.n_test,
        accuracy = format_args!("{:.4}", report.holdout_accuracy),
        log_loss = format_args!("{:.4}", report.holdout_log_loss),
        positive_rate = format_args!("{:.3}", report.holdout_positive_rate),
        "training complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    /// Declared default of a flag, independent of `POTABILITY_*` variables.
    fn declared_default(id: &str) -> String {
        let cmd = Args::command();
        let arg = cmd.get_arguments().find(|a| a.get_id() == id).unwrap();
        arg.get_default_values()[0].to_str().unwrap().to_string()
    }

    #[test]
    fn test_defaults_match_trainer_config() {
        assert_eq!(declared_default("dataset"), "df/water_potability.csv");
        assert_eq!(declared_default("output"), "improved_xgboost_model.bin");

        let flags = ["seed", "test_size", "n_estimators", "max_depth", "learning_rate"];
        let mut argv = vec!["potability-train".to_string()];
        for id in flags {
            argv.push(format!("--{}", id.replace('_', "-")));
            argv.push(declared_default(id));
        }
        let args = Args::try_parse_from(argv).unwrap();
        assert_eq!(args.trainer_config(), TrainerConfig::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from([
            "potability-train",
            "--seed",
            "7",
            "--n-estimators",
            "20",
            "--learning-rate",
            "0.1",
            "-o",
            "out.bin",
        ]);
        let config = args.trainer_config();
        assert_eq!(config.seed, 7);
        assert_eq!(config.boosting.n_estimators, 20);
        assert_eq!(config.boosting.learning_rate, 0.1);
        assert_eq!(args.output, PathBuf::from("out.bin"));
    }
}
