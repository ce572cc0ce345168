use serde::Serialize;

pub const SIGN_RAW_PAYLOAD_PATH: &str = "/public/v1/submit/sign_raw_payload";
pub const ACTIVITY_TYPE_SIGN_RAW_PAYLOAD_V2: &str = "ACTIVITY_TYPE_SIGN_RAW_PAYLOAD_V2";
pub const PAYLOAD_ENCODING_TEXT_UTF8: &str = "PAYLOAD_ENCODING_TEXT_UTF8";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HashFunction {
    #[serde(rename = "HASH_FUNCTION_SHA256")]
    Sha256,
    #[serde(rename = "HASH_FUNCTION_NOT_APPLICABLE")]
    NotApplicable,
}

impl HashFunction {
    /// Address-style identifiers (`0x...`) belong to keys the service hashes
    /// with SHA-256 before signing. Everything else signs the raw message.
    pub fn for_key(sign_with: &str) -> Self {
        let is_address = sign_with
            .get(..2)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("0x"));
        if is_address {
            HashFunction::Sha256
        } else {
            HashFunction::NotApplicable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRawPayloadParams {
    pub sign_with: String,
    pub payload: String,
    pub encoding: &'static str,
    pub hash_function: HashFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRawPayloadRequest {
    #[serde(rename = "type")]
    pub activity_type: &'static str,
    pub timestamp_ms: String,
    pub organization_id: String,
    pub parameters: SignRawPayloadParams,
}

/// Builds the sign-raw-payload activity for `payload`.
///
/// `timestamp_ms` keeps otherwise identical requests distinct.
pub fn build_sign_request(
    sign_with: &str,
    organization_id: &str,
    payload: &str,
    timestamp_ms: i64,
) -> SignRawPayloadRequest {
    SignRawPayloadRequest {
        activity_type: ACTIVITY_TYPE_SIGN_RAW_PAYLOAD_V2,
        timestamp_ms: timestamp_ms.to_string(),
        organization_id: organization_id.to_string(),
        parameters: SignRawPayloadParams {
            sign_with: sign_with.to_string(),
            payload: payload.to_string(),
            encoding: PAYLOAD_ENCODING_TEXT_UTF8,
            hash_function: HashFunction::for_key(sign_with),
        },
    }
}
