//! Reed-Solomon parity wrapping for the watermark payload.
//!
//! `nsym = 32` is the current ECC strength; `nsym = 16` is preserved as the
//! legacy strength so the extractor can still recover older watermarks.

use reed_solomon::{Decoder, Encoder};

use crate::error::ProvenanceError;

/// Current (strong) parity byte count.
pub const NSYM_CURRENT: usize = 32;
/// Legacy parity byte count, tried only on the extractor's slow path.
pub const NSYM_LEGACY: usize = 16;

/// Encodes `payload` with `nsym` Reed-Solomon parity bytes appended.
pub fn encode(payload: &[u8], nsym: usize) -> Vec<u8> {
    let encoder = Encoder::new(nsym);
    encoder.encode(payload).to_vec()
}

/// Attempts to correct and strip `nsym` parity bytes from `received`,
/// returning the original payload bytes.
pub fn decode(received: &[u8], nsym: usize) -> Result<Vec<u8>, ProvenanceError> {
    let decoder = Decoder::new(nsym);
    let corrected = decoder
        .correct(received, None)
        .map_err(|_| ProvenanceError::EccFailure)?;
    Ok(corrected.data().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_roundtrips_clean() {
        let payload = b"the quick brown fox jumps!!".to_vec();
        let encoded = encode(&payload, NSYM_CURRENT);
        let decoded = decode(&encoded, NSYM_CURRENT).expect("clean decode should succeed");
        assert_eq!(decoded, payload);
    }

    #[test]
    fn decode_corrects_bounded_byte_errors() {
        let payload = b"authenticated watermark payload".to_vec();
        let mut encoded = encode(&payload, NSYM_CURRENT);
        // NSYM_CURRENT/2 byte errors are the documented correction bound.
        for i in 0..(NSYM_CURRENT / 2) {
            encoded[i] ^= 0xFF;
        }
        let decoded = decode(&encoded, NSYM_CURRENT).expect("should correct within bound");
        assert_eq!(decoded, payload);
    }
}
