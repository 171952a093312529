//! Difference hash (dHash) perceptual fingerprint over image content.
//!
//! Resizes to a 9x8 grayscale grid and hashes the sign of each horizontal
//! adjacent-pixel gradient into a 64-bit value. Cheap, and tolerant of
//! slight crops and recompression, though not of heavy cropping or
//! rotation.

use image::{GenericImageView, imageops::FilterType};

use crate::error::ProvenanceError;
use crate::types::Fingerprint64;

const HASH_SIZE: u32 = 8;

/// Computes a dHash-64 fingerprint from already-decoded image bytes.
pub fn dhash(image_bytes: &[u8]) -> Result<Fingerprint64, ProvenanceError> {
    let dynamic = image::load_from_memory(image_bytes)
        .map_err(|e| ProvenanceError::InvalidInput(format!("could not read image: {e}")))?;
    Ok(dhash_image(&dynamic))
}

/// Computes a dHash-64 fingerprint from an already-decoded image.
pub fn dhash_image(img: &image::DynamicImage) -> Fingerprint64 {
    let gray = img.grayscale();
    let resized = gray.resize_exact(HASH_SIZE + 1, HASH_SIZE, FilterType::Triangle);

    let mut value: u64 = 0;
    for y in 0..HASH_SIZE {
        for x in 0..HASH_SIZE {
            let left = resized.get_pixel(x, y)[0];
            let right = resized.get_pixel(x + 1, y)[0];
            value = (value << 1) | (right > left) as u64;
        }
    }
    Fingerprint64(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Luma};

    fn sample_gradient_png(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Luma<u8>, Vec<u8>> =
            ImageBuffer::from_fn(width, height, |x, _y| Luma([(x * 255 / width.max(1)) as u8]));
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn dhash_is_deterministic() {
        let png = sample_gradient_png(64, 64);
        let a = dhash(&png).unwrap();
        let b = dhash(&png).unwrap();
        assert_eq!(a.0, b.0);
    }

    #[test]
    fn dhash_differs_for_visually_distinct_images() {
        let gradient = dhash(&sample_gradient_png(64, 64)).unwrap();

        let solid: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::from_pixel(64, 64, Luma([200]));
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(solid)
            .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        let flat = dhash(&buf).unwrap();

        assert!(gradient.hamming(&flat) > 0);
    }
}
