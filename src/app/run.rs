use crate::bench::runner::{run_benchmark, BenchmarkReport};
use crate::cli::app_config::Cli;
use crate::cli::env_config::Config;
use crate::http::probe::{ConnectionProbe, FreshConnectionProbe};
use crate::http::transport::{ConnectionPolicy, Transport};
use crate::report::{print_benchmark, print_config, print_probe, ConsoleProgress};
use crate::sign::client::{HttpSigningClient, SigningClient};
use crate::sign::stamp::{ApiKeyStamper, Stamper};
use crate::timing::{HttpPhaseTiming, LatencyBreakdown};
use crate::tls::client_config::build_tls_config;
use clap::Parser;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Which measurement phases to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phases {
    pub benchmark: bool,
    pub probe: bool,
}

impl Default for Phases {
    fn default() -> Self {
        Self {
            benchmark: true,
            probe: true,
        }
    }
}

impl From<&Cli> for Phases {
    fn from(cli: &Cli) -> Self {
        Self {
            benchmark: !cli.skip_benchmark,
            probe: !cli.skip_probe,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub benchmark: Option<BenchmarkReport>,
    pub probe: Option<(HttpPhaseTiming, LatencyBreakdown)>,
}

pub async fn main_with_error() -> Result<RunReport, anyhow::Error> {
    let cli: Cli = Cli::parse();

    init_logging(cli.verbosity)?;
    // Nothing touches the network before the configuration is complete.
    let config = Config::from_env(&cli)?;
    run(config, Phases::from(&cli)).await
}

fn init_logging(verbosity: u8) -> Result<(), anyhow::Error> {
    let log_level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy()
        .add_directive("hyper_util=off".parse()?);
    let subscriber = tracing_subscriber::fmt()
        .without_time()
        .with_level(true)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
    Ok(())
}

/// Wires the real HTTP collaborators and runs both phases.
pub async fn run(config: Config, phases: Phases) -> Result<RunReport, anyhow::Error> {
    let config = Arc::new(config);
    print_config(&config);

    let stamper: Arc<dyn Stamper> =
        Arc::new(ApiKeyStamper::new(&config.public_key, &config.private_key)?);
    let tls_config = build_tls_config(config.ca_path.as_deref(), config.insecure)?;

    let transport = Transport::new(
        tls_config.clone(),
        ConnectionPolicy::Pooled,
        config.timeout,
        None,
    );
    let client = HttpSigningClient::new(config.clone(), stamper.clone(), transport);
    let probe = FreshConnectionProbe::new(config.clone(), stamper, tls_config);

    execute(&config, &client, &probe, phases).await
}

/// Runs the benchmark and then the probe, printing each as it completes.
pub async fn execute(
    config: &Config,
    client: &dyn SigningClient,
    probe: &dyn ConnectionProbe,
    phases: Phases,
) -> Result<RunReport, anyhow::Error> {
    let mut report = RunReport::default();

    if phases.benchmark {
        println!("Benchmark: {} sequential calls over a reused connection", config.iterations);
        let bench = run_benchmark(client, config.iterations, &mut ConsoleProgress).await?;
        print_benchmark(&bench);
        report.benchmark = Some(bench);
    }

    if phases.probe {
        info!("Probing a fresh connection");
        let timing = probe.probe().await?;
        let breakdown = LatencyBreakdown::from_timing(&timing);
        print_probe(&timing, &breakdown);
        report.probe = Some((timing, breakdown));
    }

    Ok(report)
}
