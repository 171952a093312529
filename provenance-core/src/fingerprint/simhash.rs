//! 64-bit SimHash text fingerprint, robust to minor OCR noise and
//! formatting changes. Purely local — no external services involved.

use std::collections::HashMap;
use std::sync::OnceLock;

use md5::{Digest, Md5};
use regex::Regex;

use crate::types::Fingerprint64;

const MIN_TOKENS: usize = 10;

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[a-z0-9]{2,}").expect("static regex is valid"))
}

/// Computes a 64-bit SimHash over `text`, or `None` if fewer than
/// [`MIN_TOKENS`] tokens are found (too little signal to fingerprint
/// reliably).
pub fn simhash64(text: &str) -> Option<Fingerprint64> {
    if text.is_empty() {
        return None;
    }

    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = word_re().find_iter(&lowered).map(|m| m.as_str()).collect();
    if tokens.len() < MIN_TOKENS {
        return None;
    }

    let mut counts: HashMap<&str, i64> = HashMap::new();
    for token in &tokens {
        *counts.entry(token).or_insert(0) += 1;
    }

    let mut vec = [0i64; 64];
    for (token, weight) in counts {
        let digest = Md5::digest(token.as_bytes());
        let mut bytes8 = [0u8; 8];
        bytes8.copy_from_slice(&digest[..8]);
        let h64 = u64::from_be_bytes(bytes8);
        for (i, slot) in vec.iter_mut().enumerate() {
            let bit = (h64 >> i) & 1;
            *slot += if bit != 0 { weight } else { -weight };
        }
    }

    let mut fp: u64 = 0;
    for (i, &v) in vec.iter().enumerate() {
        if v > 0 {
            fp |= 1 << i;
        }
    }

    Some(Fingerprint64(fp))
}
