//! AWS Signature Version 4 request signing
//!
//! Wraps `aws-sigv4` with the settings S3 expects: single percent-encoding,
//! no path normalisation, and an `x-amz-content-sha256` header. Non-empty
//! bodies are sent as `UNSIGNED-PAYLOAD` so large parts are not hashed twice.

use std::collections::BTreeMap;
use std::time::SystemTime;

use aws_sigv4::http_request::{
    PayloadChecksumKind, PercentEncodingMode, SignableBody, SignableRequest, SignatureLocation,
    SigningSettings, UriPathNormalizationMode, sign,
};
use aws_sigv4::sign::v4;
use bk_core::{Credentials, Error, Result};

const SERVICE: &str = "s3";

/// Signs requests for one region
#[derive(Debug, Clone)]
pub struct Signer {
    region: String,
}

impl Signer {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Sign a request now, returning the headers to add
    pub fn sign(
        &self,
        method: &str,
        url: &str,
        headers: &BTreeMap<String, String>,
        body: &[u8],
        credentials: &Credentials,
    ) -> Result<Vec<(String, String)>> {
        self.sign_at(method, url, headers, body, credentials, SystemTime::now())
    }

    /// Sign a request as of `time`
    pub fn sign_at(
        &self,
        method: &str,
        url: &str,
        headers: &BTreeMap<String, String>,
        body: &[u8],
        credentials: &Credentials,
        time: SystemTime,
    ) -> Result<Vec<(String, String)>> {
        let identity = aws_credential_types::Credentials::new(
            &credentials.access_key,
            &credentials.secret_key,
            credentials.session_token.clone(),
            None,
            "bucketkit",
        )
        .into();

        let mut settings = SigningSettings::default();
        settings.signature_location = SignatureLocation::Headers;
        settings.payload_checksum_kind = PayloadChecksumKind::XAmzSha256;
        settings.percent_encoding_mode = PercentEncodingMode::Single;
        settings.uri_path_normalization_mode = UriPathNormalizationMode::Disabled;

        let params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(SERVICE)
            .time(time)
            .settings(settings)
            .build()
            .map_err(|e| Error::Auth(format!("Failed to build signing params: {e}")))?;

        let body = if body.is_empty() {
            SignableBody::Bytes(body)
        } else {
            SignableBody::UnsignedPayload
        };
        let signable = SignableRequest::new(
            method,
            url,
            headers.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            body,
        )
        .map_err(|e| Error::Auth(format!("Failed to create signable request: {e}")))?;

        let (instructions, _signature) = sign(signable, &params.into())
            .map_err(|e| Error::Auth(format!("Failed to sign request: {e}")))?
            .into_parts();

        Ok(instructions
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }
}
