//! The 33-byte authenticated watermark payload.
//!
//! `[version:1][id:16][hmac_tag:16]`. `unpack` is the sole gate that
//! authenticates a watermark id: any version/HMAC mismatch is reported as
//! [`ProvenanceError::InvalidSignature`], never silently accepted.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ProvenanceError;
use crate::types::WatermarkId;

type HmacSha256 = Hmac<Sha256>;

/// Payload format version embedded in byte 0 of every packed payload.
pub const VERSION_CURRENT: u8 = 2;
/// Legacy version accepted (but no longer produced) by the unpacker.
pub const VERSION_LEGACY: u8 = 1;

const ID_BYTES: usize = 16;
const TAG_BYTES: usize = 16;
/// Total length of a packed, pre-ECC payload.
pub const PAYLOAD_LEN: usize = 1 + ID_BYTES + TAG_BYTES;

fn compute_tag(secret: &str, header: &[u8]) -> [u8; TAG_BYTES] {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(header);
    let full = mac.finalize().into_bytes();
    let mut tag = [0u8; TAG_BYTES];
    tag.copy_from_slice(&full[..TAG_BYTES]);
    tag
}

/// Packs `id` into the 33-byte authenticated payload, using the current
/// payload version.
pub fn pack(id: &WatermarkId, secret: &str) -> [u8; PAYLOAD_LEN] {
    let mut header = [0u8; 1 + ID_BYTES];
    header[0] = VERSION_CURRENT;
    header[1..].copy_from_slice(&id.0);

    let tag = compute_tag(secret, &header);

    let mut payload = [0u8; PAYLOAD_LEN];
    payload[..1 + ID_BYTES].copy_from_slice(&header);
    payload[1 + ID_BYTES..].copy_from_slice(&tag);
    payload
}

/// Unpacks and authenticates a 33-byte payload, returning the watermark id.
///
/// Accepts both [`VERSION_CURRENT`] and [`VERSION_LEGACY`] version bytes;
/// any other version, any length mismatch, or a failed HMAC check is
/// reported as [`ProvenanceError::InvalidSignature`].
pub fn unpack(payload: &[u8], secret: &str) -> Result<WatermarkId, ProvenanceError> {
    if payload.len() != PAYLOAD_LEN {
        return Err(ProvenanceError::InvalidSignature);
    }

    let version = payload[0];
    if version != VERSION_CURRENT && version != VERSION_LEGACY {
        return Err(ProvenanceError::InvalidSignature);
    }

    let header = &payload[..1 + ID_BYTES];
    let tag = &payload[1 + ID_BYTES..];

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(header);
    mac.verify_truncated_left(tag)
        .map_err(|_| ProvenanceError::InvalidSignature)?;

    let mut id = [0u8; ID_BYTES];
    id.copy_from_slice(&payload[1..1 + ID_BYTES]);
    Ok(WatermarkId(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_then_unpack_roundtrips() {
        let id = WatermarkId([0x11; 16]);
        let packed = pack(&id, "supersecret");
        let recovered = unpack(&packed, "supersecret").expect("should authenticate");
        assert_eq!(recovered.0, id.0);
    }

    #[test]
    fn unpack_rejects_wrong_secret() {
        let id = WatermarkId([0x22; 16]);
        let packed = pack(&id, "secret-a");
        assert!(unpack(&packed, "secret-b").is_err());
    }

    #[test]
    fn unpack_rejects_bad_length() {
        assert!(unpack(&[0u8; 10], "supersecret").is_err());
    }

    #[test]
    fn unpack_rejects_unknown_version() {
        let id = WatermarkId([0x33; 16]);
        let mut packed = pack(&id, "supersecret");
        packed[0] = 9;
        assert!(unpack(&packed, "supersecret").is_err());
    }

    #[test]
    fn unpack_accepts_legacy_version_with_matching_tag() {
        let id = WatermarkId([0x44; 16]);
        let mut header = [0u8; 1 + ID_BYTES];
        header[0] = VERSION_LEGACY;
        header[1..].copy_from_slice(&id.0);
        let tag = compute_tag("supersecret", &header);

        let mut payload = [0u8; PAYLOAD_LEN];
        payload[..1 + ID_BYTES].copy_from_slice(&header);
        payload[1 + ID_BYTES..].copy_from_slice(&tag);

        let recovered = unpack(&payload, "supersecret").expect("legacy version should authenticate");
        assert_eq!(recovered.0, id.0);
    }
}
