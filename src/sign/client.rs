use crate::cli::env_config::Config;
use crate::http::transport::Transport;
use crate::sign::request::{build_sign_request, SIGN_RAW_PAYLOAD_PATH};
use crate::sign::stamp::Stamper;
use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use http::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use http_body_util::Full;
use hyper::{Method, Request, Uri};
use serde::Deserialize;
use std::sync::Arc;

const ERROR_BODY_LIMIT: usize = 512;

/// Result of one completed signing call.
#[derive(Debug, Clone, PartialEq)]
pub struct SignOutcome {
    pub status: u16,
    pub activity_id: Option<String>,
    pub activity_status: Option<String>,
}

#[async_trait]
pub trait SigningClient: Send + Sync {
    /// Signs the configured demo payload. Resolves once the response has been
    /// fully received and parsed.
    async fn sign_raw_payload(&self) -> Result<SignOutcome, anyhow::Error>;
}

#[derive(Debug, Default, Deserialize)]
struct ActivityEnvelope {
    #[serde(default)]
    activity: Option<Activity>,
}

#[derive(Debug, Default, Deserialize)]
struct Activity {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Builds a stamped sign-raw-payload POST with a fresh timestamp.
pub fn build_signed_request(
    config: &Config,
    stamper: &dyn Stamper,
) -> Result<Request<Full<Bytes>>, anyhow::Error> {
    let activity = build_sign_request(
        &config.sign_with,
        &config.organization_id,
        &config.payload,
        Utc::now().timestamp_millis(),
    );
    let body = serde_json::to_string(&activity)?;
    let stamp = stamper.stamp(&body).context("Failed to stamp request")?;
    let uri: Uri = config.endpoint(SIGN_RAW_PAYLOAD_PATH).parse()?;

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "application/json")
        .header(USER_AGENT, concat!("signlat/", env!("CARGO_PKG_VERSION")))
        .header(stamp.header_name, stamp.header_value)
        .body(Full::new(Bytes::from(body)))?;
    Ok(request)
}

fn body_snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.into_owned(),
    }
}

/// Signing client over a pooled connection.
pub struct HttpSigningClient {
    config: Arc<Config>,
    stamper: Arc<dyn Stamper>,
    transport: Transport,
}

impl HttpSigningClient {
    pub fn new(config: Arc<Config>, stamper: Arc<dyn Stamper>, transport: Transport) -> Self {
        Self {
            config,
            stamper,
            transport,
        }
    }
}

#[async_trait]
impl SigningClient for HttpSigningClient {
    async fn sign_raw_payload(&self) -> Result<SignOutcome, anyhow::Error> {
        let request = build_signed_request(&self.config, self.stamper.as_ref())?;
        let res = self.transport.send(request).await?;
        let status = res.status();
        let body = self.transport.read_body(res).await?;

        if !status.is_success() {
            bail!(
                "Signing request failed with status {}: {}",
                status,
                body_snippet(&body)
            );
        }

        let envelope: ActivityEnvelope =
            serde_json::from_slice(&body).context("Signing response is not valid JSON")?;
        let activity = envelope.activity.unwrap_or_default();
        debug!(
            "Activity {} status {}",
            activity.id.as_deref().unwrap_or("<none>"),
            activity.status.as_deref().unwrap_or("<none>")
        );
        if let Some(state) = activity.status.as_deref() {
            ensure!(
                state != "ACTIVITY_STATUS_FAILED" && state != "ACTIVITY_STATUS_REJECTED",
                "Signing activity ended with {}",
                state
            );
        }

        Ok(SignOutcome {
            status: status.as_u16(),
            activity_id: activity.id,
            activity_status: activity.status,
        })
    }
}
