//! Benchmark utilities for the potability pipeline.
//!
//! - Synthetic water quality samples shaped like the public dataset
//! - Timing helpers and latency statistics

pub mod data;
pub mod utils;

pub use data::WaterSampler;
pub use utils::{measure, time_fn, BenchmarkStats, Timer};
