use crate::cli::env_config::Config;
use crate::http::transport::{ConnectionPolicy, Transport};
use crate::sign::client::build_signed_request;
use crate::sign::stamp::Stamper;
use crate::timing::{HttpPhaseTiming, PhaseRecorder, TimingCollector};
use async_trait::async_trait;
use rustls::ClientConfig;
use std::sync::Arc;

#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    /// Issues one request and returns its lifecycle marks.
    async fn probe(&self) -> Result<HttpPhaseTiming, anyhow::Error>;
}

/// Sends one signing request over a connection that is opened for it alone.
pub struct FreshConnectionProbe {
    config: Arc<Config>,
    stamper: Arc<dyn Stamper>,
    tls_config: ClientConfig,
}

impl FreshConnectionProbe {
    pub fn new(config: Arc<Config>, stamper: Arc<dyn Stamper>, tls_config: ClientConfig) -> Self {
        Self {
            config,
            stamper,
            tls_config,
        }
    }
}

#[async_trait]
impl ConnectionProbe for FreshConnectionProbe {
    async fn probe(&self) -> Result<HttpPhaseTiming, anyhow::Error> {
        let request = build_signed_request(&self.config, self.stamper.as_ref())?;

        let recorder = Arc::new(PhaseRecorder::new());
        let transport = Transport::new(
            self.tls_config.clone(),
            ConnectionPolicy::Fresh,
            self.config.timeout,
            Some(recorder.clone() as Arc<dyn TimingCollector>),
        );

        recorder.begin();
        let res = transport.send(request).await?;
        recorder.mark_first_byte();
        let status = res.status().as_u16();

        let body = transport.read_body(res).await?;
        recorder.mark_complete();
        debug!("Probe response: {} bytes", body.len());

        recorder.finish(status)
    }
}
