//! Perceptual and text fingerprinting used to corroborate watermark
//! evidence, and to stand in for it on lossy paths the watermark does not
//! survive (thumbnails, screenshots, heavily recompressed re-uploads).

pub mod dhash;
pub mod simhash;

pub use dhash::{dhash, dhash_image};
pub use simhash::simhash64;
