//! Canonical PDF content hashing.
//!
//! Builds a deterministic byte payload out of a document's extracted text
//! (joined in page order) and its metadata (canonicalized as sorted-key
//! JSON), then hashes it. Not currently wired into any lookup path —
//! `Repository` has no canonical-hash index — but kept available, since
//! adding that index later is a storage change, not an algorithmic one.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::ids::canonical_metadata_hash;
use crate::types::Sha256Hash;

type HmacSha256 = Hmac<Sha256>;

fn canonical_payload(pages_text: &[String], metadata: &serde_json::Value) -> Vec<u8> {
    let joined = pages_text.join("\n");
    let meta_hash = canonical_metadata_hash(metadata);

    let mut payload = Vec::with_capacity(joined.len() + 1 + 32);
    payload.extend_from_slice(joined.as_bytes());
    payload.push(b'\n');
    payload.extend_from_slice(&meta_hash.0);
    payload
}

/// SHA-256 over the canonical text+metadata payload.
pub fn canonical_pdf_hash(pages_text: &[String], metadata: &serde_json::Value) -> Sha256Hash {
    Sha256Hash::compute(&canonical_payload(pages_text, metadata))
}

/// HMAC-SHA256 over the same canonical payload, keyed by the process
/// secret, for callers that want an authenticated variant rather than a
/// bare content hash.
pub fn compute_canonical_hmac(pages_text: &[String], metadata: &serde_json::Value, secret: &str) -> Sha256Hash {
    let payload = canonical_payload(pages_text, metadata);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(&payload);
    let full = mac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&full);
    Sha256Hash(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_hash_is_a_pure_function_of_text_and_metadata() {
        let pages = vec!["Page one text".to_string(), "Page two text".to_string()];
        let meta = json!({"title": "Report", "author": "Jamie Lin"});

        let a = canonical_pdf_hash(&pages, &meta);
        let b = canonical_pdf_hash(&pages, &meta);
        assert_eq!(a, b);
    }

    #[test]
    fn canonical_hash_changes_when_text_changes() {
        let meta = json!({"title": "Report"});
        let a = canonical_pdf_hash(&["first version".to_string()], &meta);
        let b = canonical_pdf_hash(&["second version".to_string()], &meta);
        assert_ne!(a, b);
    }

    #[test]
    fn canonical_hmac_changes_with_the_secret() {
        let pages = vec!["Same text".to_string()];
        let meta = json!({});
        let a = compute_canonical_hmac(&pages, &meta, "secret-a");
        let b = compute_canonical_hmac(&pages, &meta, "secret-b");
        assert_ne!(a, b);
    }
}
