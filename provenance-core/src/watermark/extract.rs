//! Watermark extraction: a parameter search over strength,
//! anchored regions, ECC variants, and sub-block pixel offsets, with a
//! legacy whole-image fallback for older watermarks.

use crate::block_coder;
use crate::codec::{bits_to_bytes, payload, rs};
use crate::config::WatermarkConfig;
use crate::region::{self, Anchor};

use super::plane::{Plane, rgb_to_ycbcr};

/// Outcome of a single extraction attempt.
#[derive(Clone, Debug, Default)]
pub struct DecodeAttempt {
    pub ok: bool,
    pub watermark_id_hex: Option<String>,
    pub confidence: f32,
}

impl DecodeAttempt {
    fn fail(confidence: f32) -> Self {
        Self { ok: false, watermark_id_hex: None, confidence }
    }
}

/// Result of a full extraction run.
#[derive(Clone, Debug)]
pub struct ExtractOutcome {
    pub ok: bool,
    pub watermark_id_hex: Option<String>,
    pub confidence: f32,
    pub reason: Option<String>,
}

/// Extracts a watermark from `image_bytes`.
///
/// `fast` selects the cheap, narrow parameter grid tried first by callers
/// on the happy path; set it to `false` to run the exhaustive grid
/// (including sub-block pixel offsets and the legacy whole-image scheme)
/// when the fast pass comes back empty.
pub fn extract(image_bytes: &[u8], cfg: &WatermarkConfig, fast: bool) -> ExtractOutcome {
    let dynamic = match image::load_from_memory(image_bytes) {
        Ok(d) => d,
        Err(e) => {
            return ExtractOutcome {
                ok: false,
                watermark_id_hex: None,
                confidence: 0.0,
                reason: Some(format!("could not read image: {e}")),
            };
        }
    };

    let rgb = dynamic.to_rgb8();
    let ycbcr = rgb_to_ycbcr(&rgb);
    let y_full = &ycbcr.y;

    let ecc_options: Vec<(u8, usize)> = if fast {
        vec![(2, rs::NSYM_CURRENT)]
    } else {
        vec![(1, rs::NSYM_LEGACY), (2, rs::NSYM_CURRENT)]
    };

    let mut offsets: Vec<(usize, usize)> = if fast {
        vec![(0, 0)]
    } else {
        let mut v = Vec::with_capacity(64);
        for dy in 0..8 {
            for dx in 0..8 {
                v.push((dy, dx));
            }
        }
        v
    };
    offsets.sort_by_key(|&(dy, dx)| (dy + dx, dy, dx));

    let mut deltas: Vec<f32> = if fast {
        vec![14.0, 16.0, cfg.strength]
    } else {
        vec![cfg.strength, 12.0, 14.0, 16.0, 18.0]
    };
    dedup_f32(&mut deltas);

    let mut repeat_hints: Vec<usize> = if fast {
        vec![2, 1]
    } else {
        vec![cfg.repeats.max(1), (cfg.repeats / 2).max(1), 1]
    };
    repeat_hints.dedup();

    let h8 = (y_full.height / 8) * 8;
    let w8 = (y_full.width / 8) * 8;
    let min_dim = h8.min(w8);

    let mut region_sizes: Vec<usize> = if fast {
        if min_dim < 256 { vec![(min_dim / 8 * 8).max(64)] } else { vec![256] }
    } else {
        let mut sizes = vec![256, 320, 384, 512];
        if min_dim < 256 {
            sizes.push((min_dim / 8 * 8).max(64));
        }
        sizes.retain(|&s| s >= 64 && s <= min_dim);
        sizes
    };
    region_sizes.dedup();

    let anchors: &[Anchor] = if fast { &Anchor::FAST } else { &Anchor::ALL };

    let mut best_fail: Option<DecodeAttempt> = None;

    for &delta in &deltas {
        for &rs_size in &region_sizes {
            for &anchor in anchors {
                let (y0, x0) = anchor.position(h8, w8, rs_size);
                let region_plane = y_full.region(y0, x0, rs_size);
                let seed = region::seed_from(&cfg.secret, anchor.salt());
                for &(_version, nsym) in &ecc_options {
                    for &rh in &[2usize, 1usize] {
                        let attempt =
                            decode_from_plane(&region_plane, seed, delta, rh, nsym, &cfg.secret, &offsets, fast);
                        if attempt.ok {
                            return finalize(attempt);
                        }
                        best_fail = keep_best(best_fail, attempt);
                    }
                }
            }
        }
    }

    if !fast {
        let legacy_seed = region::legacy_seed(&cfg.secret);
        for &delta in &deltas {
            for &rh in &repeat_hints {
                for &(_version, nsym) in &ecc_options {
                    let attempt =
                        decode_from_plane(y_full, legacy_seed, delta, rh, nsym, &cfg.secret, &offsets, fast);
                    if attempt.ok {
                        return finalize(attempt);
                    }
                    best_fail = keep_best(best_fail, attempt);
                }
            }
        }
    }

    let confidence = best_fail.as_ref().map(|a| a.confidence).unwrap_or(0.0);
    ExtractOutcome {
        ok: false,
        watermark_id_hex: None,
        confidence,
        reason: Some("watermark not detected (file may be original or heavily altered)".to_string()),
    }
}

fn keep_best(best: Option<DecodeAttempt>, candidate: DecodeAttempt) -> Option<DecodeAttempt> {
    match best {
        Some(b) if b.confidence >= candidate.confidence => Some(b),
        _ => Some(candidate),
    }
}

fn finalize(attempt: DecodeAttempt) -> ExtractOutcome {
    ExtractOutcome {
        ok: attempt.ok,
        watermark_id_hex: attempt.watermark_id_hex,
        confidence: attempt.confidence,
        reason: None,
    }
}

fn dedup_f32(values: &mut Vec<f32>) {
    let mut seen = Vec::new();
    values.retain(|v| {
        if seen.iter().any(|s: &f32| (s - v).abs() < f32::EPSILON) {
            false
        } else {
            seen.push(*v);
            true
        }
    });
}

#[allow(clippy::too_many_arguments)]
fn decode_from_plane(
    plane: &Plane,
    seed: u32,
    delta: f32,
    repeats_hint: usize,
    nsym: usize,
    secret: &str,
    offsets: &[(usize, usize)],
    fast: bool,
) -> DecodeAttempt {
    if plane.height < 32 || plane.width < 32 {
        return DecodeAttempt::fail(0.0);
    }

    let expected_payload_len = payload::PAYLOAD_LEN;
    let mut best: Option<DecodeAttempt> = None;

    for &(dy, dx) in offsets {
        if dy >= plane.height || dx >= plane.width {
            continue;
        }
        let shifted = plane.offset(dy, dx);
        let h8 = (shifted.height / 8) * 8;
        let w8 = (shifted.width / 8) * 8;
        if h8 < 64 || w8 < 64 {
            continue;
        }
        let cropped = shifted.crop(h8, w8);

        let blocks_y = h8 / 8;
        let blocks_x = w8 / 8;
        let num_blocks = blocks_y * blocks_x;

        let expected_encoded_len = expected_payload_len + nsym;
        let expected_bits = expected_encoded_len * 8;
        if num_blocks < expected_bits {
            continue;
        }

        let mut local_repeats = repeats_hint.max(1);
        let mut total_positions = expected_bits * local_repeats;
        if num_blocks < total_positions {
            local_repeats = (num_blocks / expected_bits).max(1);
            total_positions = expected_bits * local_repeats;
        }

        let allow_sampling = fast;
        let positions = region::block_positions(seed, num_blocks, total_positions, allow_sampling);

        let mut votes = vec![(0i32, 0i32); expected_bits];
        let mut idx = 0;
        for _ in 0..local_repeats {
            for vote in votes.iter_mut() {
                let block_index = positions[idx];
                idx += 1;
                let by = (block_index / blocks_x) * 8;
                let bx = (block_index % blocks_x) * 8;
                let block = cropped.block(by, bx);
                let bit = block_coder::extract_block(&block, delta);
                if bit == 1 {
                    vote.1 += 1;
                } else {
                    vote.0 += 1;
                }
            }
        }

        let decided: Vec<u8> = votes.iter().map(|&(zeros, ones)| if ones > zeros { 1 } else { 0 }).collect();
        let margin_sum: f32 = votes.iter().map(|&(z, o)| (o - z).unsigned_abs() as f32).sum();
        let confidence = (margin_sum / votes.len().max(1) as f32 / local_repeats.max(1) as f32).clamp(0.0, 1.0);

        let data = bits_to_bytes(&decided);
        match rs::decode(&data, nsym) {
            Ok(decoded) => match payload::unpack(&decoded, secret) {
                Ok(id) => {
                    return DecodeAttempt { ok: true, watermark_id_hex: Some(id.to_hex()), confidence };
                }
                Err(_) => {
                    let fail = DecodeAttempt::fail(confidence);
                    best = keep_best(best, fail);
                }
            },
            Err(_) => {
                let fail = DecodeAttempt::fail(confidence);
                best = keep_best(best, fail);
            }
        }
    }

    best.unwrap_or_else(|| DecodeAttempt::fail(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::mint_watermark_id;
    use crate::watermark::embed::embed;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x * 3 + y) % 256) as u8])
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn extract_recovers_embedded_id_on_untouched_image() {
        let base = sample_png(512, 512);
        let cfg = WatermarkConfig::default();
        let id = mint_watermark_id();
        let watermarked = embed(&base, &id, &cfg).expect("embed should succeed");

        let outcome = extract(&watermarked, &cfg, true);
        assert!(outcome.ok, "expected extraction to succeed: {:?}", outcome.reason);
        assert_eq!(outcome.watermark_id_hex, Some(id.to_hex()));
    }

    #[test]
    fn extract_reports_failure_on_unwatermarked_image() {
        let base = sample_png(512, 512);
        let cfg = WatermarkConfig::default();
        let outcome = extract(&base, &cfg, true);
        assert!(!outcome.ok);
    }
}
