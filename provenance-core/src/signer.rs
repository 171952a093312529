//! Client for the external document-signature service.
//!
//! Document signing/verification (PAdES) is an out-of-scope external
//! collaborator; this module only specifies the contract the document
//! verifier consumes, plus a small HTTP client implementation: base URL,
//! a bounded-timeout blocking client, and one method per remote
//! operation.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::types::Sha256Hash;

/// Errors that can occur while contacting the signer service.
#[derive(Debug)]
pub enum SignerError {
    /// Transport-level error (HTTP failure, timeout, connection refused).
    Transport(String),
    /// The signer returned a malformed or unexpected response.
    Protocol(String),
}

impl std::fmt::Display for SignerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignerError::Transport(msg) => write!(f, "signer transport error: {msg}"),
            SignerError::Protocol(msg) => write!(f, "signer protocol error: {msg}"),
        }
    }
}

impl std::error::Error for SignerError {}

/// Outcome of a PAdES signature verification call.
#[derive(Clone, Debug, Default)]
pub struct SignatureVerdict {
    /// The signature is cryptographically intact (covers the whole byte
    /// range it claims to, unmodified since signing).
    pub intact: bool,
    /// Whether the signing certificate chains to a trusted root. This is
    /// informational only — the document verifier relies on `intact` for
    /// authenticity and never gates ownership on `trusted`.
    pub trusted: bool,
    /// SHA-256 thumbprint of the signer's leaf certificate DER, when the
    /// document carries a parseable signature at all.
    pub leaf_thumbprint_sha256: Option<Sha256Hash>,
}

/// Abstract signer/verifier used by the document-verification pipeline.
pub trait Signer: Send + Sync {
    /// Verifies any embedded PAdES signature in `document_bytes`.
    fn verify(&self, document_bytes: &[u8]) -> Result<SignatureVerdict, SignerError>;
}

/// HTTP-based signer client.
///
/// Talks to an external signing service over a small JSON API; the exact
/// signing backend (PKCS#12 keystore, HSM, cloud KMS) is entirely the
/// service's concern.
pub struct HttpSigner {
    base_url: String,
    client: Client,
}

impl HttpSigner {
    /// Constructs a new HTTP signer client pointing at `base_url`
    /// (without a trailing slash), with the given request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SignerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SignerError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { base_url: base_url.into(), client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct VerifyRequestMeta {
    /// Number of bytes in the document being verified, for the service's
    /// own request logging/diagnostics.
    byte_len: usize,
}

#[derive(Debug, Deserialize)]
struct VerifyResponseBody {
    intact: bool,
    trusted: bool,
    leaf_thumbprint_sha256: Option<String>,
}

impl Signer for HttpSigner {
    fn verify(&self, document_bytes: &[u8]) -> Result<SignatureVerdict, SignerError> {
        let url = self.endpoint("/verify");
        let meta = VerifyRequestMeta { byte_len: document_bytes.len() };

        let resp = self
            .client
            .post(&url)
            .query(&meta)
            .body(document_bytes.to_vec())
            .send()
            .map_err(|e| SignerError::Transport(format!("HTTP POST {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SignerError::Transport(format!("signer service returned HTTP status {status}")));
        }

        let body = resp
            .json::<VerifyResponseBody>()
            .map_err(|e| SignerError::Protocol(format!("failed to parse JSON response: {e}")))?;

        let leaf_thumbprint_sha256 = body
            .leaf_thumbprint_sha256
            .map(|hex| Sha256Hash::from_hex(&hex))
            .transpose()
            .map_err(|e| SignerError::Protocol(format!("invalid thumbprint hex: {e}")))?;

        Ok(SignatureVerdict { intact: body.intact, trusted: body.trusted, leaf_thumbprint_sha256 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_response_body_parses_with_null_thumbprint() {
        let json = r#"{"intact": false, "trusted": false, "leaf_thumbprint_sha256": null}"#;
        let body: VerifyResponseBody = serde_json::from_str(json).unwrap();
        assert!(!body.intact);
        assert!(body.leaf_thumbprint_sha256.is_none());
    }

    #[test]
    fn verify_response_body_parses_with_thumbprint() {
        let hex = Sha256Hash::compute(b"demo cert der").to_hex();
        let json = format!(r#"{{"intact": true, "trusted": true, "leaf_thumbprint_sha256": "{hex}"}}"#);
        let body: VerifyResponseBody = serde_json::from_str(&json).unwrap();
        assert!(body.intact);
        assert_eq!(body.leaf_thumbprint_sha256, Some(hex));
    }
}
