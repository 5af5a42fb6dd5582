use std::time::{Duration, Instant};

/// Accumulating stopwatch.
#[derive(Debug, Default)]
pub struct Timer {
    start: Option<Instant>,
    total: Duration,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.start = Some(Instant::now());
    }

    /// Stop the timer and add the elapsed time to the total.
    pub fn stop(&mut self) -> Duration {
        match self.start.take() {
            Some(start) => {
                let elapsed = start.elapsed();
                self.total += elapsed;
                elapsed
            }
            None => Duration::ZERO,
        }
    }

    pub fn total_ms(&self) -> f64 {
        self.total.as_secs_f64() * 1000.0
    }
}

/// Run a function and measure its execution time.
pub fn time_fn<F, R>(f: F) -> (R, Duration)
where
    F: FnOnce() -> R,
{
    let start = Instant::now();
    let result = f();
    (result, start.elapsed())
}

/// Run `f` `warmup` times unmeasured, then `iterations` times measured.
///
/// Returns the last result with the latency statistics.
pub fn measure<F, R>(warmup: usize, iterations: usize, mut f: F) -> (Option<R>, BenchmarkStats)
where
    F: FnMut() -> R,
{
    for _ in 0..warmup {
        let _ = f();
    }

    let mut last = None;
    let mut times = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let (result, elapsed) = time_fn(&mut f);
        times.push(elapsed.as_secs_f64() * 1000.0);
        last = Some(result);
    }

    (last, BenchmarkStats::from_times(times))
}

/// Latency statistics in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkStats {
    pub iterations: usize,
    pub mean_ms: f64,
    pub std_dev_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
}

impl BenchmarkStats {
    /// Calculate statistics from a list of times in milliseconds.
    ///
    /// An empty list gives all-zero statistics.
    pub fn from_times(mut times: Vec<f64>) -> Self {
        let n = times.len();
        if n == 0 {
            return Self {
                iterations: 0,
                mean_ms: 0.0,
                std_dev_ms: 0.0,
                min_ms: 0.0,
                max_ms: 0.0,
                median_ms: 0.0,
                p95_ms: 0.0,
                p99_ms: 0.0,
            };
        }
        times.sort_by(f64::total_cmp);

        let mean = times.iter().sum::<f64>() / n as f64;
        let variance = times.iter().map(|&t| (t - mean).powi(2)).sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (times[n / 2 - 1] + times[n / 2]) / 2.0
        } else {
            times[n / 2]
        };
        let percentile = |q: f64| times[((n as f64 * q) as usize).min(n - 1)];

        Self {
            iterations: n,
            mean_ms: mean,
            std_dev_ms: variance.sqrt(),
            min_ms: times[0],
            max_ms: times[n - 1],
            median_ms: median,
            p95_ms: percentile(0.95),
            p99_ms: percentile(0.99),
        }
    }

    /// Operations per second at the mean latency, for `ops` operations per call.
    pub fn throughput(&self, ops: usize) -> f64 {
        if self.mean_ms <= 0.0 {
            return 0.0;
        }
        ops as f64 / (self.mean_ms / 1000.0)
    }
}
