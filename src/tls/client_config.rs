use crate::tls::cert_verifier::SignlatCertVerifier;
use anyhow::Context;
use rustls::crypto::ring::{default_provider, DEFAULT_CIPHER_SUITES};
use rustls::{ClientConfig, RootCertStore};
use std::path::Path;
use std::sync::Arc;

/// Builds the rustls client config shared by both measurement phases.
///
/// Trust anchors come from `ca_path` when given, otherwise from the bundled
/// WebPKI roots.
pub fn build_tls_config(
    ca_path: Option<&Path>,
    skip_certificate_validate: bool,
) -> Result<ClientConfig, anyhow::Error> {
    let mut root_store = RootCertStore::empty();
    if let Some(file_path) = ca_path {
        let f = std::fs::File::open(file_path)
            .with_context(|| format!("Failed to open CA bundle {}", file_path.display()))?;
        let mut rd = std::io::BufReader::new(f);
        for cert in rustls_pemfile::certs(&mut rd) {
            root_store.add(cert?)?;
        }
        ensure!(
            !root_store.is_empty(),
            "No certificates found in {}",
            file_path.display()
        );
    } else {
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    };

    let provider = Arc::new(rustls::crypto::CryptoProvider {
        cipher_suites: DEFAULT_CIPHER_SUITES.to_vec(),
        ..default_provider()
    });

    let verifier =
        SignlatCertVerifier::new(skip_certificate_validate, provider.clone(), &root_store)?;

    let mut tls_config = ClientConfig::builder_with_provider(provider)
        .with_protocol_versions(rustls::DEFAULT_VERSIONS)?
        .with_root_certificates(root_store)
        .with_no_client_auth();

    tls_config
        .dangerous()
        .set_certificate_verifier(Arc::new(verifier));

    Ok(tls_config)
}
