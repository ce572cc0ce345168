use crate::http::dns_logging_connector::DnsLoggingResolver;
use crate::http::timing_connector::{TcpTimingConnector, TimingConnector};
use crate::timing::TimingCollector;
use anyhow::Context;
use bytes::Bytes;
use http::header::{HeaderValue, CONNECTION};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use rustls::ClientConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Whether a transport may hand out pooled connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPolicy {
    /// Keep idle connections and reuse them, like a regular API client.
    Pooled,
    /// Open a new connection per request and close it afterwards.
    Fresh,
}

pub struct Transport {
    client: Client<TimingConnector, Full<Bytes>>,
    policy: ConnectionPolicy,
    timeout: Option<Duration>,
}

impl Transport {
    pub fn new(
        tls_config: ClientConfig,
        policy: ConnectionPolicy,
        timeout: Option<Duration>,
        collector: Option<Arc<dyn TimingCollector>>,
    ) -> Self {
        let resolver = DnsLoggingResolver::new(collector.clone());
        let mut http = HttpConnector::new_with_resolver(resolver);
        http.enforce_http(false);
        http.set_nodelay(true);

        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(TcpTimingConnector::new(http, collector.clone()));
        let connector = TimingConnector::new(https, collector);

        let mut builder = Client::builder(TokioExecutor::new());
        if policy == ConnectionPolicy::Fresh {
            builder.pool_max_idle_per_host(0);
        }

        Self {
            client: builder.build(connector),
            policy,
            timeout,
        }
    }

    /// Sends `request` and resolves once the response headers arrived.
    pub async fn send(
        &self,
        mut request: Request<Full<Bytes>>,
    ) -> Result<Response<Incoming>, anyhow::Error> {
        if self.policy == ConnectionPolicy::Fresh {
            request
                .headers_mut()
                .insert(CONNECTION, HeaderValue::from_static("close"));
        }
        debug!(
            "> {} {} {:?} ({:?} connection)",
            request.method(),
            request.uri(),
            request.version(),
            self.policy
        );

        let res = self
            .limit(self.client.request(request))
            .await?
            .context("Failed to execute request")?;
        debug!("< {:?} {}", res.version(), res.status());
        Ok(res)
    }

    /// Drains the response body.
    pub async fn read_body(&self, res: Response<Incoming>) -> Result<Bytes, anyhow::Error> {
        let collected = self
            .limit(res.into_body().collect())
            .await?
            .context("Failed to read response body")?;
        Ok(collected.to_bytes())
    }

    async fn limit<F: Future>(&self, fut: F) -> Result<F::Output, anyhow::Error> {
        match self.timeout {
            Some(limit) => timeout(limit, fut)
                .await
                .map_err(|_| anyhow!("Request timed out after {} seconds", limit.as_secs_f64())),
            None => Ok(fut.await),
        }
    }
}
