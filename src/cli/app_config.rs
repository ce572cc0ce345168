use clap::Parser;
use std::path::PathBuf;

/// Measures signing API latency: repeated calls over a reused connection,
/// then one fresh connection broken down into DNS, TCP, TLS and TTFB.
///
/// Credentials are read from the environment, see the list printed when one
/// is missing.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about)]
pub struct Cli {
    /// API base URL, overrides TURNKEY_BASE_URL.
    #[arg(long = "base-url", value_name = "URL")]
    pub base_url: Option<String>,
    /// Number of measured calls, overrides ITERATIONS.
    #[arg(
        short = 'n',
        long = "iterations",
        value_name = "count",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub iterations: Option<u32>,
    /// Trust the certificates in this PEM file instead of the WebPKI roots.
    #[arg(short = 'c', long = "cacert", value_name = "file")]
    pub certificate_path_option: Option<PathBuf>,
    /// Allow insecure server connections
    #[arg(short = 'k', long = "insecure")]
    pub skip_certificate_validate: bool,
    /// Give up on a request after this many seconds.
    #[arg(
        long = "timeout",
        value_name = "seconds",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: Option<u64>,
    /// Skip the repeated-call benchmark.
    #[arg(long = "skip-benchmark")]
    pub skip_benchmark: bool,
    /// Skip the fresh-connection timing probe.
    #[arg(long = "skip-probe")]
    pub skip_probe: bool,
    ///  Make the operation more talkative
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overrides() {
        let cli = Cli::try_parse_from([
            "signlat",
            "--base-url",
            "http://127.0.0.1:9000",
            "-n",
            "25",
            "-k",
            "--skip-probe",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(cli.iterations, Some(25));
        assert!(cli.skip_certificate_validate);
        assert!(cli.skip_probe);
        assert!(!cli.skip_benchmark);
        assert_eq!(cli.verbosity, 2);
    }

    #[test]
    fn rejects_zero_iterations() {
        assert!(Cli::try_parse_from(["signlat", "-n", "0"]).is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(Cli::try_parse_from(["signlat", "--timeout", "0"]).is_err());
        let cli = Cli::try_parse_from(["signlat", "--timeout", "5"]).unwrap();
        assert_eq!(cli.timeout_secs, Some(5));
    }
}
