//! QIM embedding/extraction over 8x8 DCT blocks.

use crate::dct;

/// Mid-frequency coefficients used for embedding, chosen to survive
/// moderate recompression while staying clear of the DC term.
pub const COEFFS: [(usize, usize); 3] = [(3, 4), (4, 3), (2, 3)];

/// Quantization Index Modulation embed: snaps `value` into one of two
/// lattices spaced `delta` apart, selected by `bit`.
pub fn qim_embed(value: f32, bit: u8, delta: f32) -> f32 {
    let q = 2.0 * delta;
    let base = (value / q).round() * q;
    base + if bit != 0 { delta } else { 0.0 }
}

/// QIM extract: recovers the bit embedded by [`qim_embed`], tolerant of
/// small perturbations from recompression/resampling.
pub fn qim_extract(value: f32, delta: f32) -> u8 {
    let q = 2.0 * delta;
    let r = value - (value / q).round() * q;
    if r > delta / 2.0 { 1 } else { 0 }
}

/// Embeds `bit` into an 8x8 luma block by QIM-modulating each coefficient
/// in [`COEFFS`] independently, returning the modified block.
pub fn embed_block(block: &[[f32; 8]; 8], bit: u8, delta: f32) -> [[f32; 8]; 8] {
    let mut coeffs = dct::forward(block);
    for &(u, v) in &COEFFS {
        coeffs[v][u] = qim_embed(coeffs[v][u], bit, delta);
    }
    dct::inverse(&coeffs)
}

/// Extracts one bit from an 8x8 luma block by majority vote (>= 2 of 3)
/// across [`COEFFS`].
pub fn extract_block(block: &[[f32; 8]; 8], delta: f32) -> u8 {
    let coeffs = dct::forward(block);
    let ones: usize = COEFFS
        .iter()
        .map(|&(u, v)| qim_extract(coeffs[v][u], delta) as usize)
        .sum();
    if ones >= (COEFFS.len() / 2 + 1) { 1 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block(offset: f32) -> [[f32; 8]; 8] {
        let mut block = [[0.0f32; 8]; 8];
        for y in 0..8 {
            for x in 0..8 {
                block[y][x] = 128.0 + offset + ((y * 8 + x) as f32 * 0.5);
            }
        }
        block
    }

    #[test]
    fn embed_then_extract_recovers_bit() {
        let block = sample_block(0.0);
        for &bit in &[0u8, 1u8] {
            let watermarked = embed_block(&block, bit, 14.0);
            let recovered = extract_block(&watermarked, 14.0);
            assert_eq!(recovered, bit, "failed to roundtrip bit {bit}");
        }
    }

    #[test]
    fn qim_embed_extract_is_self_consistent_across_values() {
        for raw in [-50.0f32, -3.0, 0.0, 7.5, 42.0, 123.25] {
            for &bit in &[0u8, 1u8] {
                let embedded = qim_embed(raw, bit, 14.0);
                assert_eq!(qim_extract(embedded, 14.0), bit);
            }
        }
    }
}
