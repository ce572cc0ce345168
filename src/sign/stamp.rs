use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use serde::Serialize;

pub const STAMP_HEADER: &str = "X-Stamp";
pub const API_KEY_SCHEME: &str = "SIGNATURE_SCHEME_TK_API_P256";

/// Authentication header for one serialized request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub header_name: &'static str,
    pub header_value: String,
}

pub trait Stamper: Send + Sync {
    fn stamp(&self, body: &str) -> Result<Stamp, anyhow::Error>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiKeyStampPayload<'a> {
    public_key: &'a str,
    scheme: &'static str,
    signature: String,
}

/// Stamps requests with a P-256 API key pair.
pub struct ApiKeyStamper {
    public_key: String,
    signing_key: SigningKey,
}

impl ApiKeyStamper {
    /// `private_key` is the hex encoded scalar, `public_key` the hex encoded
    /// compressed point.
    pub fn new(public_key: &str, private_key: &str) -> Result<Self, anyhow::Error> {
        let secret = hex::decode(private_key.trim())
            .map_err(|e| anyhow!("API private key is not valid hex: {}", e))?;
        let signing_key = SigningKey::from_slice(&secret)
            .map_err(|e| anyhow!("API private key is not a P-256 scalar: {}", e))?;

        let public_key = public_key.trim().to_ascii_lowercase();
        let derived = hex::encode(signing_key.verifying_key().to_encoded_point(true).as_bytes());
        if derived != public_key {
            warn!(
                "API public key {} does not match the private key (derived {})",
                public_key, derived
            );
        }
        Ok(Self {
            public_key,
            signing_key,
        })
    }
}

impl Stamper for ApiKeyStamper {
    fn stamp(&self, body: &str) -> Result<Stamp, anyhow::Error> {
        let signature: Signature = self.signing_key.sign(body.as_bytes());
        let payload = ApiKeyStampPayload {
            public_key: &self.public_key,
            scheme: API_KEY_SCHEME,
            signature: hex::encode(signature.to_der().as_bytes()),
        };
        let json = serde_json::to_vec(&payload)?;
        Ok(Stamp {
            header_name: STAMP_HEADER,
            header_value: URL_SAFE_NO_PAD.encode(json),
        })
    }
}
