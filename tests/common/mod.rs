#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rcgen::CertifiedKey;
use rustls::crypto::ring::default_provider;
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::ServerConfig;
use std::collections::HashMap;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

pub const PRIVATE_KEY: &str = "c9afa9d845ba75166b5c215767b1d6934e50c3db36e89b127b8a622b120f6721";
pub const ORGANIZATION_ID: &str = "org-stub";
pub const SIGN_PATH: &str = "/public/v1/submit/sign_raw_payload";

pub fn public_key_hex() -> String {
    let secret = hex::decode(PRIVATE_KEY).unwrap();
    let key = SigningKey::from_slice(&secret).unwrap();
    hex::encode(key.verifying_key().to_encoded_point(true).as_bytes())
}

/// Environment with every required variable set.
pub fn credentials(sign_with: &str) -> HashMap<String, String> {
    HashMap::from([
        ("TURNKEY_API_PRIVATE_KEY".to_string(), PRIVATE_KEY.to_string()),
        ("TURNKEY_API_PUBLIC_KEY".to_string(), public_key_hex()),
        ("TURNKEY_ORGANIZATION_ID".to_string(), ORGANIZATION_ID.to_string()),
        ("SIGN_WITH".to_string(), sign_with.to_string()),
    ])
}

/// Counts traffic seen by [`spawn_stub`].
#[derive(Default)]
pub struct StubStats {
    pub connections: AtomicUsize,
    pub requests: AtomicUsize,
    pub connection_close: AtomicUsize,
    pub bad_stamps: AtomicUsize,
}

impl StubStats {
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn connection_close(&self) -> usize {
        self.connection_close.load(Ordering::SeqCst)
    }

    pub fn bad_stamps(&self) -> usize {
        self.bad_stamps.load(Ordering::SeqCst)
    }
}

fn verify_stamp(stamp: &str, body: &[u8]) -> bool {
    let check = || -> Option<bool> {
        let decoded = URL_SAFE_NO_PAD.decode(stamp).ok()?;
        let json: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
        let key = hex::decode(json["publicKey"].as_str()?).ok()?;
        let der = hex::decode(json["signature"].as_str()?).ok()?;
        let verifying = VerifyingKey::from_sec1_bytes(&key).ok()?;
        let signature = Signature::from_der(&der).ok()?;
        Some(verifying.verify(body, &signature).is_ok())
    };
    check().unwrap_or(false)
}

async fn handle(
    stats: Arc<StubStats>,
    status: StatusCode,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    stats.requests.fetch_add(1, Ordering::SeqCst);
    if req
        .headers()
        .get(hyper::header::CONNECTION)
        .is_some_and(|v| v.as_bytes().eq_ignore_ascii_case(b"close"))
    {
        stats.connection_close.fetch_add(1, Ordering::SeqCst);
    }
    let path = req.uri().path().to_string();
    let stamp = req
        .headers()
        .get("x-stamp")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = req.into_body().collect().await?.to_bytes();

    let stamped = stamp.is_some_and(|s| verify_stamp(&s, &body));
    if !stamped {
        stats.bad_stamps.fetch_add(1, Ordering::SeqCst);
    }

    let (status, text) = if path != SIGN_PATH {
        (StatusCode::NOT_FOUND, "no such route".to_string())
    } else if !stamped {
        (StatusCode::UNAUTHORIZED, "invalid stamp".to_string())
    } else if status != StatusCode::OK {
        (status, "stub failure".to_string())
    } else {
        let n = stats.requests();
        (
            StatusCode::OK,
            format!(r#"{{"activity":{{"id":"act-{n}","status":"ACTIVITY_STATUS_COMPLETED"}}}}"#),
        )
    };

    let mut res = Response::new(Full::new(Bytes::from(text)));
    *res.status_mut() = status;
    Ok(res)
}

async fn serve<S>(stream: S, stats: Arc<StubStats>, status: StatusCode)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = service_fn(move |req| handle(stats.clone(), status, req));
    let _ = http1::Builder::new()
        .serve_connection(TokioIo::new(stream), service)
        .await;
}

/// Serves the signing endpoint on 127.0.0.1, answering every valid request
/// with `status`.
pub async fn spawn_stub(status: StatusCode) -> (SocketAddr, Arc<StubStats>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stats = Arc::new(StubStats::default());

    let server_stats = stats.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            server_stats.connections.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(serve(stream, server_stats.clone(), status));
        }
    });

    (addr, stats)
}

/// A stub behind TLS with a freshly generated self-signed `localhost`
/// certificate.
pub struct TlsStub {
    pub addr: SocketAddr,
    pub stats: Arc<StubStats>,
    /// PEM file holding the stub's certificate, usable as a CA bundle.
    pub ca_file: NamedTempFile,
}

impl TlsStub {
    pub fn base_url(&self) -> String {
        format!("https://localhost:{}", self.addr.port())
    }
}

pub async fn spawn_tls_stub(status: StatusCode) -> TlsStub {
    let CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();

    let mut ca_file = NamedTempFile::new().unwrap();
    ca_file.write_all(cert.pem().as_bytes()).unwrap();
    ca_file.flush().unwrap();

    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));
    let server_config = ServerConfig::builder_with_provider(Arc::new(default_provider()))
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert.der().clone()], key)
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(server_config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stats = Arc::new(StubStats::default());

    let server_stats = stats.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            server_stats.connections.fetch_add(1, Ordering::SeqCst);
            let acceptor = acceptor.clone();
            let conn_stats = server_stats.clone();
            tokio::spawn(async move {
                // Rejected handshakes are expected when the client distrusts us.
                if let Ok(tls) = acceptor.accept(stream).await {
                    serve(tls, conn_stats, status).await;
                }
            });
        }
    });

    TlsStub {
        addr,
        stats,
        ca_file,
    }
}
