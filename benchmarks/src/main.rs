//! Quick timing run for the potability pipeline.
//!
//! Trains on a synthetic dataset, round-trips the artifact bytes, then
//! measures single-row and batch prediction latency. Use
//! `cargo bench -p benchmarks` for criterion runs.

use anyhow::Context;
use benchmarks::{measure, BenchmarkStats, Timer, WaterSampler};
use clap::Parser;
use potability::trainer::Trainer;
use potability::{FeatureRow, FittedPipeline, Predictor};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "potability-bench", about = "Time training and prediction on synthetic data")]
struct Args {
    /// Labeled rows to train on
    #[arg(long, default_value_t = 3276)]
    rows: usize,

    /// Rows per batch prediction
    #[arg(long, default_value_t = 1000)]
    batch: usize,

    /// Boosting rounds
    #[arg(long, default_value_t = 100)]
    trees: usize,

    /// Measured iterations per prediction benchmark
    #[arg(long, default_value_t = 200)]
    iterations: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn report(name: &str, ops: usize, stats: &BenchmarkStats) {
    info!(
        bench = name,
        mean_ms = stats.mean_ms,
        p95_ms = stats.p95_ms,
        p99_ms = stats.p99_ms,
        rows_per_sec = stats.throughput(ops).round(),
        "latency"
    );
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut sampler = WaterSampler::new(args.seed);
    let dataset = sampler.dataset(args.rows).context("generating training data")?;

    let trainer = Trainer::builder()
        .n_estimators(args.trees)
        .seed(args.seed)
        .build();
    let mut timer = Timer::new();

    timer.start();
    let outcome = trainer.fit(&dataset).context("training failed")?;
    let train_time = timer.stop();
    info!(
        rows = args.rows,
        trees = args.trees,
        secs = train_time.as_secs_f64(),
        holdout_accuracy = outcome.report.holdout_accuracy,
        "trained"
    );

    timer.start();
    let bytes = outcome.pipeline.to_bytes().context("encoding artifact")?;
    let pipeline = FittedPipeline::from_bytes(&bytes)
        .map_err(anyhow::Error::msg)
        .context("decoding artifact")?;
    let artifact_time = timer.stop();
    info!(
        bytes = bytes.len(),
        round_trip_ms = artifact_time.as_secs_f64() * 1000.0,
        setup_ms = timer.total_ms(),
        "artifact round trip"
    );

    let predictor = Predictor::new(pipeline);

    let row = FeatureRow::default();
    let (_, stats) = measure(10, args.iterations, || predictor.predict_proba_one(&row));
    report("predict_one", 1, &stats);

    let table = sampler.table(args.batch);
    let (last, stats) = measure(3, args.iterations, || predictor.predict_batch(&table));
    if let Some(result) = last {
        result.context("batch prediction failed")?;
    }
    report("predict_batch", args.batch, &stats);

    Ok(())
}
