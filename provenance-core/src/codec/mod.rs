//! Payload packing/authentication and Reed-Solomon parity.

pub mod payload;
pub mod rs;

/// Expands an encoded byte stream into a bit sequence, MSB-first per byte.
pub fn bytes_to_bits(data: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(data.len() * 8);
    for byte in data {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1);
        }
    }
    bits
}

/// Packs a bit sequence (MSB-first per byte) back into bytes.
///
/// `bits.len()` must be a multiple of 8.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u8, |acc, &bit| (acc << 1) | (bit & 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_bytes_roundtrip() {
        let data = vec![0xDE, 0xAD, 0xBE, 0xEF];
        let bits = bytes_to_bits(&data);
        assert_eq!(bits.len(), data.len() * 8);
        let back = bits_to_bytes(&bits);
        assert_eq!(back, data);
    }
}
