//! 8x8 forward/inverse discrete cosine transform over `f32` blocks.
//!
//! This is a small, self-contained orthonormal DCT-II/DCT-III pair, in the
//! spirit of the block transforms hand-rolled inside real JPEG codecs
//! rather than a general-purpose FFT-based DCT crate pulled in for a single
//! fixed 8x8 size. Only internal consistency between [`forward`] and
//! [`inverse`] matters: the watermark embedder and extractor always use
//! this same pair, so bit-exact parity with any particular reference
//! implementation's rounding is not required.

const N: usize = 8;

fn alpha(u: usize) -> f32 {
    if u == 0 { (1.0 / N as f32).sqrt() } else { (2.0 / N as f32).sqrt() }
}

fn cos_table() -> [[f32; N]; N] {
    let mut table = [[0.0f32; N]; N];
    for x in 0..N {
        for u in 0..N {
            table[x][u] =
                (std::f32::consts::PI * (2.0 * x as f32 + 1.0) * u as f32 / (2.0 * N as f32))
                    .cos();
        }
    }
    table
}

/// Forward 8x8 DCT-II of `block` (row-major, `block[y][x]`).
pub fn forward(block: &[[f32; N]; N]) -> [[f32; N]; N] {
    let cos = cos_table();
    let mut tmp = [[0.0f32; N]; N];

    // DCT along rows.
    for y in 0..N {
        for u in 0..N {
            let mut sum = 0.0;
            for x in 0..N {
                sum += block[y][x] * cos[x][u];
            }
            tmp[y][u] = alpha(u) * sum;
        }
    }

    // DCT along columns.
    let mut out = [[0.0f32; N]; N];
    for u in 0..N {
        for v in 0..N {
            let mut sum = 0.0;
            for y in 0..N {
                sum += tmp[y][u] * cos[y][v];
            }
            out[v][u] = alpha(v) * sum;
        }
    }
    out
}

/// Inverse 8x8 DCT-III of `coeffs`, the exact inverse of [`forward`].
pub fn inverse(coeffs: &[[f32; N]; N]) -> [[f32; N]; N] {
    let cos = cos_table();
    let mut tmp = [[0.0f32; N]; N];

    for v in 0..N {
        for x in 0..N {
            let mut sum = 0.0;
            for u in 0..N {
                sum += alpha(u) * coeffs[v][u] * cos[x][u];
            }
            tmp[v][x] = sum;
        }
    }

    let mut out = [[0.0f32; N]; N];
    for x in 0..N {
        for y in 0..N {
            let mut sum = 0.0;
            for v in 0..N {
                sum += alpha(v) * tmp[v][x] * cos[y][v];
            }
            out[y][x] = sum;
        }
    }
    out
}
