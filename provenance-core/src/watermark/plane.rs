//! Luma-plane extraction and BT.601 YCbCr round-tripping.
//!
//! Only the luma plane is ever watermarked; chroma passes through
//! untouched. The exact conversion constants only need to be internally
//! consistent between [`rgb_to_plane`] and [`plane_to_rgb`] — a watermark
//! embedded and extracted by this same pair survives recompression
//! regardless of which luma formula a downstream viewer happens to use.

use image::{Rgb, RgbImage};

/// A single-channel float plane with explicit row-major stride.
#[derive(Clone)]
pub struct Plane {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

impl Plane {
    pub fn new(width: usize, height: usize) -> Self {
        Self { data: vec![0.0; width * height], width, height }
    }

    #[inline]
    pub fn at(&self, y: usize, x: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, y: usize, x: usize, v: f32) {
        self.data[y * self.width + x] = v;
    }

    /// Reads an 8x8 block at `(y0, x0)`.
    pub fn block(&self, y0: usize, x0: usize) -> [[f32; 8]; 8] {
        let mut block = [[0.0f32; 8]; 8];
        for y in 0..8 {
            for x in 0..8 {
                block[y][x] = self.at(y0 + y, x0 + x);
            }
        }
        block
    }

    /// Writes an 8x8 block at `(y0, x0)`, clamping to `[0, 255]`.
    pub fn set_block(&mut self, y0: usize, x0: usize, block: &[[f32; 8]; 8]) {
        for y in 0..8 {
            for x in 0..8 {
                self.set(y0 + y, x0 + x, block[y][x].clamp(0.0, 255.0));
            }
        }
    }

    /// Returns a sub-plane view starting at `(dy, dx)`, copying data.
    pub fn offset(&self, dy: usize, dx: usize) -> Plane {
        let width = self.width - dx;
        let height = self.height - dy;
        let mut out = Plane::new(width, height);
        for y in 0..height {
            for x in 0..width {
                out.set(y, x, self.at(y + dy, x + dx));
            }
        }
        out
    }

    /// Returns the top-left `height x width` crop of this plane.
    pub fn crop(&self, height: usize, width: usize) -> Plane {
        let mut out = Plane::new(width, height);
        for y in 0..height {
            for x in 0..width {
                out.set(y, x, self.at(y, x));
            }
        }
        out
    }

    /// Returns a `size x size` sub-plane view starting at `(y0, x0)`.
    pub fn region(&self, y0: usize, x0: usize, size: usize) -> Plane {
        let mut out = Plane::new(size, size);
        for y in 0..size {
            for x in 0..size {
                out.set(y, x, self.at(y0 + y, x0 + x));
            }
        }
        out
    }

    /// Writes a `size x size` sub-plane back at `(y0, x0)`.
    pub fn write_region(&mut self, y0: usize, x0: usize, region: &Plane) {
        for y in 0..region.height {
            for x in 0..region.width {
                self.set(y0 + y, x0 + x, region.at(y, x));
            }
        }
    }
}

/// Full YCbCr (BT.601) decomposition of an RGB image, luma as a float
/// [`Plane`], chroma kept per-pixel for reconstruction.
pub struct YCbCrImage {
    pub y: Plane,
    pub cb: Vec<f32>,
    pub cr: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

pub fn rgb_to_ycbcr(img: &RgbImage) -> YCbCrImage {
    let (width, height) = img.dimensions();
    let (width, height) = (width as usize, height as usize);
    let mut y_plane = Plane::new(width, height);
    let mut cb = vec![0.0f32; width * height];
    let mut cr = vec![0.0f32; width * height];

    for (idx, px) in img.pixels().enumerate() {
        let r = px[0] as f32;
        let g = px[1] as f32;
        let b = px[2] as f32;
        let y = 0.299 * r + 0.587 * g + 0.114 * b;
        let cb_v = -0.168736 * r - 0.331264 * g + 0.5 * b + 128.0;
        let cr_v = 0.5 * r - 0.418688 * g - 0.081312 * b + 128.0;
        y_plane.data[idx] = y;
        cb[idx] = cb_v;
        cr[idx] = cr_v;
    }

    YCbCrImage { y: y_plane, cb, cr, width, height }
}

pub fn ycbcr_to_rgb(img: &YCbCrImage) -> RgbImage {
    let mut out = RgbImage::new(img.width as u32, img.height as u32);
    for idx in 0..img.y.data.len() {
        let y = img.y.data[idx];
        let cb = img.cb[idx] - 128.0;
        let cr = img.cr[idx] - 128.0;
        let r = (y + 1.402 * cr).clamp(0.0, 255.0) as u8;
        let g = (y - 0.344136 * cb - 0.714136 * cr).clamp(0.0, 255.0) as u8;
        let b = (y + 1.772 * cb).clamp(0.0, 255.0) as u8;
        let x = (idx % img.width) as u32;
        let yy = (idx / img.width) as u32;
        out.put_pixel(x, yy, Rgb([r, g, b]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ycbcr_roundtrip_preserves_color_within_rounding() {
        let mut img = RgbImage::new(4, 4);
        for (i, px) in img.pixels_mut().enumerate() {
            let v = (i * 17 % 256) as u8;
            *px = Rgb([v, v.wrapping_add(40), v.wrapping_add(90)]);
        }
        let ycbcr = rgb_to_ycbcr(&img);
        let back = ycbcr_to_rgb(&ycbcr);
        for (a, b) in img.pixels().zip(back.pixels()) {
            for c in 0..3 {
                assert!((a[c] as i32 - b[c] as i32).abs() <= 2);
            }
        }
    }
}
