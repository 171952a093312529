//! Watermark embedding: payload packing, ECC, and redundant
//! anchored-region QIM embedding into an image's luma plane.

use image::{DynamicImage, ImageFormat};

use crate::block_coder;
use crate::codec::{bytes_to_bits, payload, rs};
use crate::config::WatermarkConfig;
use crate::error::ProvenanceError;
use crate::region::{self, Anchor};
use crate::types::WatermarkId;

use super::plane::{rgb_to_ycbcr, ycbcr_to_rgb};

/// Embeds `id` into `image_bytes`, returning re-encoded image bytes.
///
/// PNG inputs are re-encoded losslessly as PNG; JPEG inputs are re-encoded
/// as JPEG at quality 95, matching the balance between visual fidelity and
/// file size the original embedder used.
pub fn embed(image_bytes: &[u8], id: &WatermarkId, cfg: &WatermarkConfig) -> Result<Vec<u8>, ProvenanceError> {
    let format = image::guess_format(image_bytes)
        .map_err(|e| ProvenanceError::InvalidInput(format!("could not detect image format: {e}")))?;

    let dynamic = image::load_from_memory_with_format(image_bytes, format)
        .map_err(|e| ProvenanceError::InvalidInput(format!("could not decode image: {e}")))?;

    let has_alpha = dynamic.color().has_alpha();
    let rgba = dynamic.to_rgba8();
    let alpha: Vec<u8> = rgba.pixels().map(|p| p[3]).collect();
    let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();

    let mut ycbcr = rgb_to_ycbcr(&rgb);

    let payload = payload::pack(id, &cfg.secret);
    let encoded = rs::encode(&payload, rs::NSYM_CURRENT);
    let bits = bytes_to_bits(&encoded);

    let h8 = (ycbcr.height / 8) * 8;
    let w8 = (ycbcr.width / 8) * 8;
    let min_dim = h8.min(w8);
    if min_dim < 64 {
        return Err(ProvenanceError::InvalidInput(
            "image too small to embed watermark".to_string(),
        ));
    }

    let region_size = region::region_size_for(h8, w8);
    let regions = region::resolve_regions(&Anchor::ALL, h8, w8, region_size);
    let region_repeats = region::region_repeats(cfg.repeats, regions.len());

    for r in &regions {
        embed_region(&mut ycbcr.y, r.y0, r.x0, r.size, &cfg.secret, r.anchor.salt(), region_repeats, &bits, cfg.strength);
    }

    let watermarked_rgb = ycbcr_to_rgb(&ycbcr);

    let mut out = Vec::new();
    match format {
        ImageFormat::Png => {
            let final_image = if has_alpha {
                let mut rgba_out = image::RgbaImage::new(watermarked_rgb.width(), watermarked_rgb.height());
                for (idx, px) in watermarked_rgb.pixels().enumerate() {
                    let x = (idx as u32) % watermarked_rgb.width();
                    let y = (idx as u32) / watermarked_rgb.width();
                    rgba_out.put_pixel(x, y, image::Rgba([px[0], px[1], px[2], alpha[idx]]));
                }
                DynamicImage::ImageRgba8(rgba_out)
            } else {
                DynamicImage::ImageRgb8(watermarked_rgb)
            };
            final_image
                .write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)
                .map_err(|e| ProvenanceError::Internal(format!("failed to encode PNG: {e}")))?;
        }
        _ => {
            // Every non-PNG input (JPEG, BMP, GIF, TIFF, WebP, ...) is
            // re-encoded as JPEG, matching `output_ext = ".png" if ext ==
            // ".png" else ".jpg"` in the original embedder.
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, 95);
            encoder
                .encode_image(&watermarked_rgb)
                .map_err(|e| ProvenanceError::Internal(format!("failed to encode JPEG: {e}")))?;
        }
    }

    Ok(out)
}

#[allow(clippy::too_many_arguments)]
fn embed_region(
    y_plane: &mut super::plane::Plane,
    y0: usize,
    x0: usize,
    size: usize,
    secret: &str,
    salt: &str,
    region_repeats: usize,
    bits: &[u8],
    delta: f32,
) {
    let blocks_per_side = size / 8;
    let num_blocks = blocks_per_side * blocks_per_side;
    if num_blocks == 0 {
        return;
    }

    let Some(local_repeats) = region::local_repeats(num_blocks, bits.len(), region_repeats) else {
        return;
    };

    let seed = region::seed_from(secret, salt);
    let total_positions = bits.len() * local_repeats;
    let positions = region::block_positions(seed, num_blocks, total_positions, false);

    let mut idx = 0;
    for _ in 0..local_repeats {
        for &bit in bits {
            let block_index = positions[idx];
            idx += 1;
            let by = (block_index / blocks_per_side) * 8;
            let bx = (block_index % blocks_per_side) * 8;
            let abs_y = y0 + by;
            let abs_x = x0 + bx;
            let block = y_plane.block(abs_y, abs_x);
            let watermarked = block_coder::embed_block(&block, bit, delta);
            y_plane.set_block(abs_y, abs_x, &watermarked);
        }
    }
}
