use crate::cli::app_config::Cli;
use hyper::Uri;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const ENV_PRIVATE_KEY: &str = "TURNKEY_API_PRIVATE_KEY";
pub const ENV_PUBLIC_KEY: &str = "TURNKEY_API_PUBLIC_KEY";
pub const ENV_ORGANIZATION_ID: &str = "TURNKEY_ORGANIZATION_ID";
pub const ENV_SIGN_WITH: &str = "SIGN_WITH";
pub const ENV_ITERATIONS: &str = "ITERATIONS";
pub const ENV_BASE_URL: &str = "TURNKEY_BASE_URL";

pub const REQUIRED_VARS: [&str; 4] = [
    ENV_PRIVATE_KEY,
    ENV_PUBLIC_KEY,
    ENV_ORGANIZATION_ID,
    ENV_SIGN_WITH,
];

pub const DEFAULT_ITERATIONS: u32 = 10;
pub const DEFAULT_BASE_URL: &str = "https://api.turnkey.com";
pub const DEMO_PAYLOAD: &str = "signlat: hello from the latency benchmark";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}\n\n{}", .missing.join(", "), usage())]
    Missing { missing: Vec<&'static str> },
    #[error("ITERATIONS must be a positive integer, got {value:?}\n\n{}", usage())]
    InvalidIterations { value: String },
    #[error("Invalid base URL {value:?}: {reason}")]
    InvalidBaseUrl { value: String, reason: String },
}

/// Remediation text listing every variable the tool reads.
pub fn usage() -> String {
    let mut text = String::from("Required environment variables:\n");
    text.push_str(&format!("  {ENV_PRIVATE_KEY:<26} API private key (hex)\n"));
    text.push_str(&format!("  {ENV_PUBLIC_KEY:<26} API public key (hex, compressed)\n"));
    text.push_str(&format!("  {ENV_ORGANIZATION_ID:<26} organization id\n"));
    text.push_str(&format!("  {ENV_SIGN_WITH:<26} signing key id or address\n"));
    text.push_str("Optional environment variables:\n");
    text.push_str(&format!(
        "  {ENV_ITERATIONS:<26} measured calls (default {DEFAULT_ITERATIONS})\n"
    ));
    text.push_str(&format!(
        "  {ENV_BASE_URL:<26} API base URL (default {DEFAULT_BASE_URL})"
    ));
    text
}

/// Settings for one run. Built once at startup and shared read-only.
#[derive(Clone)]
pub struct Config {
    pub base_url: String,
    pub private_key: String,
    pub public_key: String,
    pub organization_id: String,
    pub sign_with: String,
    pub iterations: u32,
    pub payload: String,
    pub ca_path: Option<PathBuf>,
    pub insecure: bool,
    pub timeout: Option<Duration>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key)
            .field("organization_id", &self.organization_id)
            .field("sign_with", &self.sign_with)
            .field("iterations", &self.iterations)
            .field("payload", &self.payload)
            .field("ca_path", &self.ca_path)
            .field("insecure", &self.insecure)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    pub fn from_env(cli: &Cli) -> Result<Self, ConfigError> {
        Self::load(cli, |name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`, with command line overrides taking
    /// precedence. Blank values count as unset.
    pub fn load<F>(cli: &Cli, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let values = REQUIRED_VARS.map(|name| get(name));
        let missing: Vec<&'static str> = REQUIRED_VARS
            .iter()
            .zip(&values)
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();
        let [Some(private_key), Some(public_key), Some(organization_id), Some(sign_with)] = values
        else {
            return Err(ConfigError::Missing { missing });
        };

        let iterations = match (cli.iterations, get(ENV_ITERATIONS)) {
            (Some(n), _) => n,
            (None, Some(raw)) => parse_iterations(&raw)?,
            (None, None) => DEFAULT_ITERATIONS,
        };

        let base_url = cli
            .base_url
            .clone()
            .or_else(|| get(ENV_BASE_URL))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = validate_base_url(&base_url)?;

        Ok(Self {
            base_url,
            private_key,
            public_key,
            organization_id,
            sign_with,
            iterations,
            payload: DEMO_PAYLOAD.to_string(),
            ca_path: cli.certificate_path_option.clone(),
            insecure: cli.skip_certificate_validate,
            timeout: cli.timeout_secs.map(Duration::from_secs),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    #[cfg(test)]
    pub(crate) fn for_tests(base_url: &str, sign_with: &str) -> Self {
        let cli = Cli {
            base_url: Some(base_url.to_string()),
            ..Cli::default()
        };
        Self::load(&cli, |name| match name {
            ENV_SIGN_WITH => Some(sign_with.to_string()),
            ENV_ITERATIONS => None,
            other => Some(format!("{}-value", other.to_lowercase())),
        })
        .expect("test config")
    }
}

fn parse_iterations(raw: &str) -> Result<u32, ConfigError> {
    match raw.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ConfigError::InvalidIterations {
            value: raw.to_string(),
        }),
    }
}

/// Accepts an absolute http(s) URL and strips trailing slashes.
fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    let uri: Uri = raw.parse().map_err(|_| invalid("not a URL"))?;
    match uri.scheme_str() {
        Some("http") | Some("https") => {}
        _ => return Err(invalid("scheme must be http or https")),
    }
    if uri.host().is_none() {
        return Err(invalid("missing host"));
    }
    if uri.query().is_some() {
        return Err(invalid("query strings are not supported"));
    }
    Ok(raw.trim_end_matches('/').to_string())
}
