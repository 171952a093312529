//! Robust image watermarking: payload embedding and parameter-search
//! extraction over anchored, redundant DCT/QIM regions.

pub mod embed;
pub mod extract;
pub mod plane;

pub use embed::embed;
pub use extract::{ExtractOutcome, extract};
