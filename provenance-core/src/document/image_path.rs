//! Image verification path: watermark extraction
//! first, perceptual dHash fallback second.

use crate::config::{DocumentVerifierConfig, WatermarkConfig};
use crate::fingerprint::dhash;
use crate::repository::Repository;
use crate::types::record::ProvenanceRecord;
use crate::types::{WatermarkCode, WatermarkId};
use crate::watermark;

/// A possible (not authoritative) match surfaced when the watermark could
/// not be decoded but a visually similar prior upload exists.
#[derive(Clone, Debug)]
pub struct PerceptualFallback {
    pub hamming_distance: u32,
    pub match_type: &'static str,
    pub record: ProvenanceRecord,
}

/// Outcome of verifying an uploaded image.
#[derive(Clone, Debug)]
pub struct ImageVerifyOutcome {
    pub valid: bool,
    pub confidence: f64,
    pub tamper_suspected: bool,
    pub watermark_id: Option<WatermarkId>,
    pub watermark_code: Option<WatermarkCode>,
    pub record: Option<ProvenanceRecord>,
    pub reason: Option<String>,
    pub fallback: Option<PerceptualFallback>,
}

/// Tamper floor used only on the "could not even read a watermark or
/// similarity match" terminal branch.
const NO_EVIDENCE_TAMPER_FLOOR: f64 = 0.35;

/// Verifies an uploaded image: extracts the embedded watermark (fast pass,
/// then the exhaustive slow pass if that comes back empty) and, failing
/// that, falls back to a perceptual-hash similarity scan.
pub fn verify_image(
    bytes: &[u8],
    watermark_cfg: &WatermarkConfig,
    doc_cfg: &DocumentVerifierConfig,
    repo: &dyn Repository,
) -> ImageVerifyOutcome {
    let mut outcome = watermark::extract(bytes, watermark_cfg, true);
    if !outcome.ok {
        outcome = watermark::extract(bytes, watermark_cfg, false);
    }

    if outcome.ok {
        let Some(hex) = outcome.watermark_id_hex.as_deref() else {
            return ImageVerifyOutcome {
                valid: false,
                confidence: outcome.confidence as f64,
                tamper_suspected: true,
                watermark_id: None,
                watermark_code: None,
                record: None,
                reason: Some("internal error: extractor reported success without an id".to_string()),
                fallback: None,
            };
        };
        let id = WatermarkId::from_hex(hex)
            .expect("extractor only returns ids it successfully authenticated");

        return match repo.find_record_by_watermark_id(&id) {
            Ok(Some(record)) => {
                let confidence = outcome.confidence as f64;
                ImageVerifyOutcome {
                    valid: true,
                    confidence,
                    tamper_suspected: confidence < doc_cfg.image_tamper_confidence_floor,
                    watermark_id: Some(id),
                    watermark_code: Some(record.watermark_code.clone()),
                    record: Some(record),
                    reason: None,
                    fallback: None,
                }
            }
            Ok(None) => ImageVerifyOutcome {
                valid: false,
                confidence: outcome.confidence as f64,
                tamper_suspected: true,
                watermark_id: Some(id),
                watermark_code: Some(id.code()),
                record: None,
                reason: Some("extracted but unknown".to_string()),
                fallback: None,
            },
            Err(e) => ImageVerifyOutcome {
                valid: false,
                confidence: outcome.confidence as f64,
                tamper_suspected: true,
                watermark_id: Some(id),
                watermark_code: Some(id.code()),
                record: None,
                reason: Some(format!("repository lookup failed: {e}")),
                fallback: None,
            },
        };
    }

    perceptual_fallback(bytes, doc_cfg, repo, outcome.confidence as f64, outcome.reason)
}

fn perceptual_fallback(
    bytes: &[u8],
    cfg: &DocumentVerifierConfig,
    repo: &dyn Repository,
    confidence: f64,
    extract_reason: Option<String>,
) -> ImageVerifyOutcome {
    let query_hash = match dhash(bytes) {
        Ok(h) => h,
        Err(_) => {
            return ImageVerifyOutcome {
                valid: false,
                confidence,
                tamper_suspected: confidence < NO_EVIDENCE_TAMPER_FLOOR,
                watermark_id: None,
                watermark_code: None,
                record: None,
                reason: extract_reason,
                fallback: None,
            };
        }
    };

    let candidates = repo.scan_recent_with_perceptual_hash(cfg.recent_scan_limit).unwrap_or_default();

    let mut best: Option<(u32, ProvenanceRecord)> = None;
    let mut second_best_dist: Option<u32> = None;
    for record in candidates {
        let Some(ph) = record.perceptual_hash else { continue };
        let dist = query_hash.hamming(&ph);
        match &best {
            None => best = Some((dist, record)),
            Some((best_dist, _)) if dist < *best_dist => {
                second_best_dist = Some(*best_dist);
                best = Some((dist, record));
            }
            _ => {
                if second_best_dist.is_none_or(|sb| dist < sb) {
                    second_best_dist = Some(dist);
                }
            }
        }
    }

    let fallback = best.and_then(|(dist, record)| {
        let gap_ok = second_best_dist.is_none_or(|sb| dist + cfg.image_fallback_min_gap <= sb);
        if dist <= cfg.image_fallback_max_distance && gap_ok {
            Some(PerceptualFallback { hamming_distance: dist, match_type: "possible", record })
        } else {
            None
        }
    });

    ImageVerifyOutcome {
        valid: false,
        confidence,
        tamper_suspected: confidence < NO_EVIDENCE_TAMPER_FLOOR,
        watermark_id: None,
        watermark_code: None,
        record: None,
        reason: extract_reason,
        fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::mint_watermark_id;
    use crate::repository::InMemoryRepository;
    use crate::types::{Fingerprint64, Sha256Hash};
    use crate::watermark::embed;
    use chrono::Utc;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use serde_json::json;

    fn sample_png(width: u32, height: u32, seed: u8) -> Vec<u8> {
        let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([
                (x.wrapping_add(seed as u32) % 256) as u8,
                (y % 256) as u8,
                ((x + y) % 256) as u8,
            ])
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn record_for(id: WatermarkId, perceptual_hash: Option<Fingerprint64>) -> ProvenanceRecord {
        ProvenanceRecord {
            id,
            user_id: "user-1".to_string(),
            original_filename: "photo.png".to_string(),
            stored_filename: format!("{}.png", id.code().0),
            mime_type: "image/png".to_string(),
            original_file_hash: Sha256Hash::compute(id.0.as_slice()),
            watermark_id: id,
            watermark_code: id.code(),
            perceptual_hash,
            pdf_text_simhash: None,
            metadata: json!({}),
            metadata_hash: Sha256Hash::compute(b"{}"),
            per_page_hashes: Vec::new(),
            signed_at: None,
            signer_cert_thumbprint: None,
            issued_at: Utc::now(),
            source_created_at: None,
            algo_version: 2,
        }
    }

    #[test]
    fn verify_image_succeeds_on_known_watermark() {
        let cfg = WatermarkConfig::default();
        let doc_cfg = DocumentVerifierConfig::default();
        let repo = InMemoryRepository::new();

        let id = mint_watermark_id();
        let base = sample_png(512, 512, 0);
        let watermarked = embed(&base, &id, &cfg).unwrap();
        repo.insert_record(record_for(id, None)).unwrap();

        let outcome = verify_image(&watermarked, &cfg, &doc_cfg, &repo);
        assert!(outcome.valid);
        assert_eq!(outcome.watermark_id, Some(id));
        assert!(!outcome.tamper_suspected);
    }

    #[test]
    fn verify_image_reports_unknown_for_extracted_but_unregistered_watermark() {
        let cfg = WatermarkConfig::default();
        let doc_cfg = DocumentVerifierConfig::default();
        let repo = InMemoryRepository::new();

        let id = mint_watermark_id();
        let base = sample_png(512, 512, 1);
        let watermarked = embed(&base, &id, &cfg).unwrap();

        let outcome = verify_image(&watermarked, &cfg, &doc_cfg, &repo);
        assert!(!outcome.valid);
        assert!(outcome.tamper_suspected);
        assert_eq!(outcome.reason.as_deref(), Some("extracted but unknown"));
    }

    #[test]
    fn verify_image_falls_back_to_perceptual_match_when_unwatermarked() {
        let cfg = WatermarkConfig::default();
        let doc_cfg = DocumentVerifierConfig::default();
        let repo = InMemoryRepository::new();

        let base = sample_png(64, 64, 2);
        let query_hash = dhash(&base).unwrap();
        let id = mint_watermark_id();
        repo.insert_record(record_for(id, Some(query_hash))).unwrap();

        let outcome = verify_image(&base, &cfg, &doc_cfg, &repo);
        assert!(!outcome.valid);
        let fallback = outcome.fallback.expect("expected a perceptual fallback match");
        assert_eq!(fallback.hamming_distance, 0);
        assert_eq!(fallback.record.id, id);
    }
}
