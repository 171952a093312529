//! ID/code minting and canonical metadata hashing.

use serde_json::Value;

use crate::types::{Sha256Hash, WatermarkId};

/// Mints a new, uniformly random 128-bit watermark id.
pub fn mint_watermark_id() -> WatermarkId {
    use rand::RngCore;
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    WatermarkId(bytes)
}

/// Computes the canonical metadata hash: SHA-256 of `metadata` encoded with
/// sorted object keys and no whitespace.
///
/// `serde_json::Value`'s own `Serialize` impl already emits maps in
/// insertion order, so object keys are sorted explicitly before encoding.
pub fn canonical_metadata_hash(metadata: &Value) -> Sha256Hash {
    let canonical = canonicalize(metadata);
    let bytes = serde_json::to_vec(&canonical).expect("canonicalized JSON must serialize");
    Sha256Hash::compute(&bytes)
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted = serde_json::Map::new();
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Result of normalizing a user-supplied watermark token.
#[derive(Debug, Eq, PartialEq)]
pub enum WatermarkToken {
    /// Token looked like a watermark code (`WMK-XXXXXXXXXXXX`).
    Code(String),
    /// Token looked like a raw hex watermark id.
    Id(String),
}

/// Strips path and extension noise from a pasted filename or URL and
/// classifies the remainder as a watermark code or a raw hex id, tolerant
/// of inputs like `WMK-ABCDEF012345.png` or a full path to a downloaded
/// file.
pub fn normalize_watermark_token(raw: &str) -> WatermarkToken {
    let trimmed = raw.trim();
    let basename = trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed);
    let stem = match basename.rfind('.') {
        Some(dot) if dot > 0 => &basename[..dot],
        _ => basename,
    };

    if stem.to_uppercase().starts_with("WMK-") {
        WatermarkToken::Code(stem.to_uppercase())
    } else {
        WatermarkToken::Id(stem.to_lowercase())
    }
}

/// Normalizes `raw` and looks it up against `repo` as either a code or a
/// raw hex id, so callers don't have to branch on [`WatermarkToken`]
/// themselves. Returns `Ok(None)` both for a record that genuinely isn't
/// found and for a raw id that fails to parse as hex.
pub fn lookup_by_token(
    raw: &str,
    repo: &dyn crate::repository::Repository,
) -> Result<Option<crate::types::record::ProvenanceRecord>, crate::error::ProvenanceError> {
    match normalize_watermark_token(raw) {
        WatermarkToken::Code(code) => repo.find_record_by_watermark_code(&crate::types::WatermarkCode(code)),
        WatermarkToken::Id(hex) => match WatermarkId::from_hex(&hex) {
            Ok(id) => repo.find_record_by_watermark_id(&id),
            Err(_) => Ok(None),
        },
    }
}
