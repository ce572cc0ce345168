use pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::client::danger::HandshakeSignatureValid;
use rustls::client::danger::ServerCertVerified;
use rustls::client::danger::ServerCertVerifier;
use rustls::crypto::CryptoProvider;
use rustls::DigitallySignedStruct;
use rustls::Error;
use rustls::RootCertStore;
use rustls::SignatureScheme;
use std::sync::Arc;

/// WebPKI verification with an opt-out for `--insecure`.
///
/// Handshake signatures are always checked, only the chain and name checks
/// are skipped.
#[derive(Debug)]
pub struct SignlatCertVerifier {
    verifier: Arc<dyn ServerCertVerifier>,
    skip_validate: bool,
}

impl SignlatCertVerifier {
    pub fn new(
        skip_validate: bool,
        provider: Arc<CryptoProvider>,
        root_store: &RootCertStore,
    ) -> Result<Self, anyhow::Error> {
        let verifier = rustls::client::WebPkiServerVerifier::builder_with_provider(
            root_store.clone().into(),
            provider,
        )
        .build()?;

        Ok(Self {
            verifier,
            skip_validate,
        })
    }
}

impl ServerCertVerifier for SignlatCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, Error> {
        debug!(
            "Server certificate for {:?}: {} bytes, {} intermediates",
            server_name,
            end_entity.as_ref().len(),
            intermediates.len()
        );

        if self.skip_validate {
            warn!("Skipping certificate validation for {:?}", server_name);
            Ok(ServerCertVerified::assertion())
        } else {
            self.verifier
                .verify_server_cert(end_entity, intermediates, server_name, ocsp, now)
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        self.verifier.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, Error> {
        self.verifier.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.verifier.supported_verify_schemes()
    }
}
