use crate::bench::stats::Summary;
use crate::sign::client::SigningClient;
use crate::timing::as_millis_f64;
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::time::Instant;

/// One measured call.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationSample {
    pub index: u32,
    pub duration_ms: f64,
    pub started_at: DateTime<Utc>,
}

/// Receives benchmark progress as it happens.
pub trait ProgressSink {
    fn warmup(&mut self, duration_ms: f64);
    fn iteration(&mut self, sample: &IterationSample, total: u32);
}

#[derive(Debug, Clone)]
pub struct BenchmarkReport {
    pub warmup_ms: f64,
    /// Samples in execution order.
    pub samples: Vec<IterationSample>,
    pub summary: Summary,
}

/// Runs one discarded warmup call, then `iterations` measured calls one after
/// the other. The first failing call aborts the run.
pub async fn run_benchmark(
    client: &dyn SigningClient,
    iterations: u32,
    sink: &mut dyn ProgressSink,
) -> Result<BenchmarkReport, anyhow::Error> {
    ensure!(iterations >= 1, "iteration count must be at least 1");

    let start = Instant::now();
    let outcome = client
        .sign_raw_payload()
        .await
        .context("Warmup call failed")?;
    let warmup_ms = as_millis_f64(start.elapsed());
    debug!("Warmup outcome: {:?}", outcome);
    sink.warmup(warmup_ms);

    // Grows with completed calls only; `iterations` is caller-controlled.
    let mut samples = Vec::new();
    for index in 1..=iterations {
        let started_at = Utc::now();
        let start = Instant::now();
        client
            .sign_raw_payload()
            .await
            .with_context(|| format!("Signing call {}/{} failed", index, iterations))?;
        let sample = IterationSample {
            index,
            duration_ms: as_millis_f64(start.elapsed()),
            started_at,
        };
        sink.iteration(&sample, iterations);
        samples.push(sample);
    }

    let mut durations: Vec<f64> = samples.iter().map(|s| s.duration_ms).collect();
    let summary =
        Summary::from_samples(&mut durations).ok_or(anyhow!("no samples were collected"))?;

    Ok(BenchmarkReport {
        warmup_ms,
        samples,
        summary,
    })
}
