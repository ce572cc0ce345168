// Connector layers that report connection lifecycle events to a
// `TimingCollector`. The stack is:
//
//   TimingConnector (TLS ready) -> HttpsConnector -> TcpTimingConnector (TCP
//   connected) -> HttpConnector -> DnsLoggingResolver (DNS resolved)

use crate::http::dns_logging_connector::DnsLoggingResolver;
use crate::timing::TimingCollector;
use hyper::Uri;
use hyper_rustls::{HttpsConnector, MaybeHttpsStream};
use hyper_util::client::legacy::connect::HttpConnector;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower_service::Service;

type TcpConnector = HttpConnector<DnsLoggingResolver>;
type TcpResponse = <TcpConnector as Service<Uri>>::Response;
type TcpError = <TcpConnector as Service<Uri>>::Error;

type TlsConnector = HttpsConnector<TcpTimingConnector>;
type TlsError = <TlsConnector as Service<Uri>>::Error;

/// Marks the moment the TCP connection is established.
#[derive(Clone)]
pub struct TcpTimingConnector {
    inner: TcpConnector,
    collector: Option<Arc<dyn TimingCollector>>,
}

impl TcpTimingConnector {
    pub fn new(inner: TcpConnector, collector: Option<Arc<dyn TimingCollector>>) -> Self {
        Self { inner, collector }
    }
}

impl Service<Uri> for TcpTimingConnector {
    type Response = TcpResponse;
    type Error = TcpError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        let connecting = self.inner.call(dst);
        let collector = self.collector.clone();
        Box::pin(async move {
            let io = connecting.await?;
            if let Some(collector) = collector {
                collector.mark_connected();
            }
            trace!("TCP connection established");
            Ok(io)
        })
    }
}

/// Marks the moment the TLS session is ready. Plain http connections
/// never produce this mark.
#[derive(Clone)]
pub struct TimingConnector {
    inner: TlsConnector,
    collector: Option<Arc<dyn TimingCollector>>,
}

impl TimingConnector {
    pub fn new(inner: TlsConnector, collector: Option<Arc<dyn TimingCollector>>) -> Self {
        Self { inner, collector }
    }
}

impl Service<Uri> for TimingConnector {
    type Response = MaybeHttpsStream<TcpResponse>;
    type Error = TlsError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        let connecting = self.inner.call(dst);
        let collector = self.collector.clone();
        Box::pin(async move {
            let stream = connecting.await?;
            if let MaybeHttpsStream::Https(_) = &stream {
                if let Some(collector) = collector {
                    collector.mark_secure();
                }
                trace!("TLS session established");
            }
            Ok(stream)
        })
    }
}
