use crate::bench::runner::{BenchmarkReport, IterationSample, ProgressSink};
use crate::cli::env_config::Config;
use crate::sign::request::HashFunction;
use crate::timing::{HttpPhaseTiming, LatencyBreakdown};

/// Prints benchmark progress to stdout as soon as each call returns.
pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn warmup(&mut self, duration_ms: f64) {
        println!("Warmup call: {:.2} ms (not counted)", duration_ms);
    }

    fn iteration(&mut self, sample: &IterationSample, total: u32) {
        let width = total.to_string().len();
        println!(
            "  [{:>width$}/{}] {:>10.2} ms  started {}",
            sample.index,
            total,
            sample.duration_ms,
            sample.started_at.format("%H:%M:%S%.3f"),
            width = width
        );
    }
}

pub fn print_config(config: &Config) {
    println!("Signing latency benchmark");
    println!("  API:           {}", config.base_url);
    println!("  Organization:  {}", config.organization_id);
    println!("  Public key:    {}", config.public_key);
    println!("  Sign with:     {}", config.sign_with);
    let hash = match HashFunction::for_key(&config.sign_with) {
        HashFunction::Sha256 => "SHA-256 before signing",
        HashFunction::NotApplicable => "none (raw message)",
    };
    println!("  Hashing:       {}", hash);
    println!("  Payload:       {:?}", config.payload);
    println!("  Iterations:    {}", config.iterations);
    if let Some(limit) = config.timeout {
        println!("  Timeout:       {} s", limit.as_secs());
    }
    println!();
}

pub fn print_benchmark(report: &BenchmarkReport) {
    println!();
    print!("{}", report.summary);
    println!();
}

pub fn print_probe(timing: &HttpPhaseTiming, breakdown: &LatencyBreakdown) {
    print!("{}", timing);
    println!();
    print!("{}", breakdown);
}
