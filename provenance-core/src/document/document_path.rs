//! Document verification path: PAdES signature lookup first,
//! perceptual-hash + text SimHash matching second.

use crate::config::{DocumentVerifierConfig, OcrConfig};
use crate::fingerprint::{dhash_image, simhash64};
use crate::ocr::DocumentRasterizer;
use crate::repository::Repository;
use crate::semantic;
use crate::signer::Signer;
use crate::types::record::ProvenanceRecord;
use crate::types::{Fingerprint64, Sha256Hash};

use super::rank::RankTuple;

/// Number of pages sampled for the OCR-vs-metadata similarity diagnostic,
/// a short prefix rather than the full `OcrConfig::max_pages` budget.
const SIMILARITY_SAMPLE_PAGES: usize = 5;

/// Which of the two acceptance paths produced a verified match.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DocumentVerifyMethod {
    Pades,
    PerceptualPdf,
    PerceptualPdfAmbiguous,
}

/// OCR-vs-stored-metadata similarity diagnostic, attached whenever a
/// match was found and OCR text could be produced.
#[derive(Clone, Debug)]
pub struct SimilarityDiagnostics {
    pub ocr_text: String,
    pub similarity_score: f64,
    pub tamper_flag: bool,
    pub diff_summary: Option<String>,
}

/// Outcome of verifying an uploaded document.
#[derive(Clone, Debug, Default)]
pub struct DocumentVerifyOutcome {
    pub valid: bool,
    pub method: Option<DocumentVerifyMethod>,
    pub confidence: Option<f64>,
    pub ownership_confidence: Option<f64>,
    pub tamper_suspected: bool,
    pub signature_valid: Option<bool>,
    pub signer_cert_thumbprint: Option<Sha256Hash>,
    pub record: Option<ProvenanceRecord>,
    pub candidates: Vec<ProvenanceRecord>,
    pub reason: Option<String>,
    pub similarity: Option<SimilarityDiagnostics>,
}

/// Verifies an uploaded document: a signature-backed exact lookup, then a
/// perceptual + text similarity scan among recent issuances.
pub fn verify_document(
    bytes: &[u8],
    cfg: &DocumentVerifierConfig,
    ocr_cfg: &OcrConfig,
    repo: &dyn Repository,
    signer: &dyn Signer,
    rasterizer: &dyn DocumentRasterizer,
) -> DocumentVerifyOutcome {
    if let Some(outcome) = verify_by_signature(bytes, repo, signer, ocr_cfg, rasterizer) {
        return outcome;
    }

    verify_by_perceptual_match(bytes, cfg, ocr_cfg, repo, rasterizer)
}

fn verify_by_signature(
    bytes: &[u8],
    repo: &dyn Repository,
    signer: &dyn Signer,
    ocr_cfg: &OcrConfig,
    rasterizer: &dyn DocumentRasterizer,
) -> Option<DocumentVerifyOutcome> {
    let verdict = signer.verify(bytes).ok()?;
    if !verdict.intact {
        return None;
    }
    let thumbprint = verdict.leaf_thumbprint_sha256?;

    let byte_hash = Sha256Hash::compute(bytes);
    let record = match repo.find_record_by_original_hash(&byte_hash) {
        Ok(Some(record)) => Some(record),
        _ => None,
    };

    let record = match record {
        Some(record) => Some(record),
        None => match repo.find_records_by_signer_thumbprint(&thumbprint) {
            Ok(matches) if matches.len() == 1 => matches.into_iter().next(),
            Ok(matches) if matches.len() > 1 => {
                return Some(DocumentVerifyOutcome {
                    valid: false,
                    method: None,
                    signature_valid: Some(true),
                    signer_cert_thumbprint: Some(thumbprint),
                    reason: Some("cannot uniquely map owner".to_string()),
                    candidates: matches,
                    ..Default::default()
                });
            }
            _ => None,
        },
    };

    let record = record?;
    let similarity = compute_similarity_diagnostics(bytes, &record, ocr_cfg, rasterizer);

    Some(DocumentVerifyOutcome {
        valid: true,
        method: Some(DocumentVerifyMethod::Pades),
        confidence: Some(1.0),
        ownership_confidence: Some(1.0),
        tamper_suspected: false,
        signature_valid: Some(true),
        signer_cert_thumbprint: Some(thumbprint),
        record: Some(record),
        candidates: Vec::new(),
        reason: None,
        similarity,
    })
}

fn compute_similarity_diagnostics(
    bytes: &[u8],
    record: &ProvenanceRecord,
    ocr_cfg: &OcrConfig,
    rasterizer: &dyn DocumentRasterizer,
) -> Option<SimilarityDiagnostics> {
    let ocr_text = rasterizer.extract_text(bytes, ocr_cfg.max_pages.min(SIMILARITY_SAMPLE_PAGES)).ok()?;

    let common = record.common_metadata_fields();
    let reference: Vec<&str> = [
        common.title.as_deref(),
        common.author.as_deref(),
        common.organization.as_deref(),
        common.created_date.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if reference.is_empty() {
        return None;
    }
    let reference_text = reference.join(" ");

    let similarity_score = semantic::combined_similarity(&ocr_text, &reference_text);
    let tamper_flag = similarity_score < semantic::SIMILARITY_FLAG_FLOOR;
    let diff_summary = tamper_flag.then(|| semantic::short_diff_summary(&ocr_text, &reference_text, 200));

    Some(SimilarityDiagnostics { ocr_text, similarity_score, tamper_flag, diff_summary })
}

struct CandidateEval {
    record: ProvenanceRecord,
    rank: RankTuple,
}

fn verify_by_perceptual_match(
    bytes: &[u8],
    cfg: &DocumentVerifierConfig,
    ocr_cfg: &OcrConfig,
    repo: &dyn Repository,
    rasterizer: &dyn DocumentRasterizer,
) -> DocumentVerifyOutcome {
    let Ok(pages) = rasterizer.render_pages_rgb(bytes, ocr_cfg.dpi, ocr_cfg.max_pages) else {
        return DocumentVerifyOutcome {
            valid: false,
            reason: Some("no authoritative signature and no perceptual match".to_string()),
            ..Default::default()
        };
    };
    if pages.is_empty() {
        return DocumentVerifyOutcome {
            valid: false,
            reason: Some("no authoritative signature and no perceptual match".to_string()),
            ..Default::default()
        };
    }

    let query_pages: Vec<Fingerprint64> = pages.iter().map(dhash_image).collect();
    let query_text = rasterizer.extract_text(bytes, ocr_cfg.max_pages).ok();
    let query_sim = query_text.as_deref().and_then(simhash64);

    let candidates = repo.scan_recent_with_per_page_hashes(cfg.recent_scan_limit).unwrap_or_default();

    let mut evaluated: Vec<CandidateEval> = candidates
        .into_iter()
        .filter(|c| !c.per_page_hashes.is_empty())
        .map(|record| {
            let rank = rank_candidate(&query_pages, query_sim, &record, cfg);
            CandidateEval { record, rank }
        })
        .collect();

    evaluated.sort_by(|a, b| b.rank.cmp(&a.rank));

    let Some(best) = evaluated.first() else {
        return DocumentVerifyOutcome {
            valid: false,
            reason: Some("no authoritative signature and no perceptual match".to_string()),
            ..Default::default()
        };
    };

    let gate_pass = gate_passes(cfg, query_pages.len(), best, evaluated.get(1), query_sim);

    if gate_pass {
        let record = best.record.clone();
        let similarity = compute_similarity_diagnostics(bytes, &record, ocr_cfg, rasterizer);
        let mut tamper_suspected = best.rank.dist_score < 0.9;
        if let Some(sim) = &similarity {
            if sim.tamper_flag {
                tamper_suspected = true;
            }
        }
        return DocumentVerifyOutcome {
            valid: false,
            method: Some(DocumentVerifyMethod::PerceptualPdf),
            confidence: None,
            ownership_confidence: Some(best.rank.overlap_score),
            tamper_suspected,
            signature_valid: None,
            signer_cert_thumbprint: None,
            record: Some(record),
            candidates: Vec::new(),
            reason: None,
            similarity,
        };
    }

    if best.rank.overlap_score >= cfg.min_overlap_score {
        let reason = ambiguous_reason(query_pages.len(), query_sim, best, evaluated.get(1), cfg);
        let top5: Vec<ProvenanceRecord> = evaluated.iter().take(5).map(|c| c.record.clone()).collect();
        return DocumentVerifyOutcome {
            valid: false,
            method: Some(DocumentVerifyMethod::PerceptualPdfAmbiguous),
            ownership_confidence: Some(best.rank.overlap_score),
            candidates: top5,
            reason: Some(reason.to_string()),
            ..Default::default()
        };
    }

    DocumentVerifyOutcome {
        valid: false,
        reason: Some("no authoritative signature and no perceptual match".to_string()),
        ..Default::default()
    }
}

fn rank_candidate(
    query_pages: &[Fingerprint64],
    query_sim: Option<Fingerprint64>,
    candidate: &ProvenanceRecord,
    cfg: &DocumentVerifierConfig,
) -> RankTuple {
    let mut total_min_dist = 0u32;
    let mut matched_pages = 0usize;
    for qh in query_pages {
        let best_dist = candidate
            .per_page_hashes
            .iter()
            .map(|ch| qh.hamming(ch))
            .min()
            .unwrap_or(64);
        total_min_dist += best_dist;
        if best_dist <= cfg.page_match_max_distance {
            matched_pages += 1;
        }
    }
    let overlap_score = matched_pages as f64 / query_pages.len() as f64;
    let avg_min_distance = total_min_dist as f64 / query_pages.len() as f64;
    let dist_score = 1.0 - avg_min_distance.min(64.0) / 64.0;

    let (text_rank, text_score) = match (query_sim, candidate.pdf_text_simhash) {
        (Some(qs), Some(cs)) => {
            let dist = qs.hamming(&cs);
            let rank = if dist <= cfg.max_text_distance { 2 } else { 0 };
            (rank, 1.0 - dist as f64 / 64.0)
        }
        _ => (1u8, -1.0),
    };

    RankTuple { overlap_score, dist_score, text_rank, text_score }
}

fn gate_passes(
    cfg: &DocumentVerifierConfig,
    query_pages: usize,
    best: &CandidateEval,
    second: Option<&CandidateEval>,
    query_sim: Option<Fingerprint64>,
) -> bool {
    if query_pages < cfg.min_query_pages {
        return false;
    }
    if best.rank.overlap_score < cfg.min_overlap_score {
        return false;
    }
    let min_dist_required = if query_pages == 2 { cfg.min_dist_score_two_page } else { cfg.min_dist_score };
    if best.rank.dist_score < min_dist_required {
        return false;
    }

    let margin_ok = match second {
        None => true,
        Some(second) => {
            let overlap_gap = best.rank.overlap_score - second.rank.overlap_score;
            let dist_gap_threshold = if query_pages == 2 { 0.04 } else { 0.03 };
            let dist_gap = best.rank.dist_score - second.rank.dist_score;
            overlap_gap >= 0.10 || dist_gap >= dist_gap_threshold
        }
    };
    if !margin_ok {
        return false;
    }

    query_sim.is_some()
        && best.record.pdf_text_simhash.is_some()
        && best.rank.text_rank == 2
}

/// Classifies why the acceptance gate failed despite a promising overlap
/// score, for the ambiguous-match response.
fn ambiguous_reason(
    query_pages: usize,
    query_sim: Option<Fingerprint64>,
    best: &CandidateEval,
    second: Option<&CandidateEval>,
    cfg: &DocumentVerifierConfig,
) -> &'static str {
    if query_pages < cfg.min_query_pages {
        return "one_page_only";
    }
    if query_sim.is_none() {
        return "no_query_text";
    }
    if best.record.pdf_text_simhash.is_none() {
        return "candidate_missing_text";
    }
    if best.rank.text_rank != 2 {
        return "text_mismatch";
    }
    let _ = second;
    "non_unique"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::mint_watermark_id;
    use crate::ocr::OcrError;
    use crate::repository::InMemoryRepository;
    use crate::signer::{SignatureVerdict, SignerError};
    use chrono::Utc;
    use image::DynamicImage;
    use serde_json::json;

    struct StubSigner(SignatureVerdict);
    impl Signer for StubSigner {
        fn verify(&self, _bytes: &[u8]) -> Result<SignatureVerdict, SignerError> {
            Ok(self.0.clone())
        }
    }

    struct StubRasterizer {
        text: String,
        pages: Vec<DynamicImage>,
    }
    impl DocumentRasterizer for StubRasterizer {
        fn extract_text(&self, _bytes: &[u8], _max_pages: usize) -> Result<String, OcrError> {
            Ok(self.text.clone())
        }
        fn render_pages_rgb(&self, _bytes: &[u8], _dpi: u32, _max_pages: usize) -> Result<Vec<DynamicImage>, OcrError> {
            Ok(self.pages.clone())
        }
    }

    fn sample_record(byte: u8, per_page: Vec<Fingerprint64>, text_sim: Option<Fingerprint64>) -> ProvenanceRecord {
        let id = mint_watermark_id();
        ProvenanceRecord {
            id,
            user_id: "user-1".to_string(),
            original_filename: "doc.pdf".to_string(),
            stored_filename: format!("{}.pdf", id.code().0),
            mime_type: "application/pdf".to_string(),
            original_file_hash: Sha256Hash::compute(&[byte]),
            watermark_id: id,
            watermark_code: id.code(),
            perceptual_hash: None,
            pdf_text_simhash: text_sim,
            metadata: json!({"title": "Quarterly Report", "author": "Jamie Lin"}),
            metadata_hash: Sha256Hash::compute(b"{}"),
            per_page_hashes: per_page,
            signed_at: None,
            signer_cert_thumbprint: None,
            issued_at: Utc::now(),
            source_created_at: None,
            algo_version: 2,
        }
    }

    #[test]
    fn signature_path_matches_by_original_hash_and_succeeds() {
        let bytes = b"byte identical pdf contents";
        let repo = InMemoryRepository::new();
        let mut record = sample_record(1, Vec::new(), None);
        record.original_file_hash = Sha256Hash::compute(bytes);
        repo.insert_record(record.clone()).unwrap();

        let signer = StubSigner(SignatureVerdict {
            intact: true,
            trusted: true,
            leaf_thumbprint_sha256: Some(Sha256Hash::compute(b"cert")),
        });
        let rasterizer = StubRasterizer { text: "Quarterly Report by Jamie Lin".to_string(), pages: Vec::new() };
        let cfg = DocumentVerifierConfig::default();
        let ocr_cfg = OcrConfig::default();

        let outcome = verify_document(bytes, &cfg, &ocr_cfg, &repo, &signer, &rasterizer);
        assert!(outcome.valid);
        assert_eq!(outcome.method, Some(DocumentVerifyMethod::Pades));
        assert_eq!(outcome.confidence, Some(1.0));
        assert!(!outcome.tamper_suspected);
    }

    #[test]
    fn signature_path_rejects_ambiguous_thumbprint_matches() {
        let bytes = b"some pdf bytes not matching any stored hash";
        let repo = InMemoryRepository::new();
        let thumb = Sha256Hash::compute(b"shared cert");
        let mut a = sample_record(2, Vec::new(), None);
        a.signer_cert_thumbprint = Some(thumb);
        let mut b = sample_record(3, Vec::new(), None);
        b.signer_cert_thumbprint = Some(thumb);
        repo.insert_record(a).unwrap();
        repo.insert_record(b).unwrap();

        let signer = StubSigner(SignatureVerdict { intact: true, trusted: true, leaf_thumbprint_sha256: Some(thumb) });
        let rasterizer = StubRasterizer { text: String::new(), pages: Vec::new() };
        let cfg = DocumentVerifierConfig::default();
        let ocr_cfg = OcrConfig::default();

        let outcome = verify_document(bytes, &cfg, &ocr_cfg, &repo, &signer, &rasterizer);
        assert!(!outcome.valid);
        assert_eq!(outcome.reason.as_deref(), Some("cannot uniquely map owner"));
    }

    #[test]
    fn perceptual_path_falls_through_to_no_match_when_everything_is_absent() {
        let bytes = b"unrelated pdf";
        let repo = InMemoryRepository::new();
        let signer = StubSigner(SignatureVerdict::default());
        let rasterizer = StubRasterizer { text: String::new(), pages: Vec::new() };
        let cfg = DocumentVerifierConfig::default();
        let ocr_cfg = OcrConfig::default();

        let outcome = verify_document(bytes, &cfg, &ocr_cfg, &repo, &signer, &rasterizer);
        assert!(!outcome.valid);
        assert_eq!(outcome.method, None);
        assert_eq!(outcome.reason.as_deref(), Some("no authoritative signature and no perceptual match"));
    }

    #[test]
    fn perceptual_path_accepts_strong_page_and_text_overlap() {
        let page = DynamicImage::new_rgb8(32, 32);
        let page_hash = dhash_image(&page);
        let query_text = "Quarterly Report by Jamie Lin covering fiscal results and outlook";
        let text_sim = simhash64(query_text).unwrap();

        let repo = InMemoryRepository::new();
        repo.insert_record(sample_record(4, vec![page_hash, page_hash], Some(text_sim))).unwrap();

        let signer = StubSigner(SignatureVerdict::default());
        let rasterizer = StubRasterizer { text: query_text.to_string(), pages: vec![page.clone(), page] };
        let cfg = DocumentVerifierConfig::default();
        let ocr_cfg = OcrConfig::default();

        let outcome = verify_document(b"query bytes", &cfg, &ocr_cfg, &repo, &signer, &rasterizer);
        assert!(!outcome.valid, "perceptual matches never set `valid`, only ownership_confidence");
        assert_eq!(outcome.method, Some(DocumentVerifyMethod::PerceptualPdf));
        assert_eq!(outcome.ownership_confidence, Some(1.0));
    }

    #[test]
    fn perceptual_path_flags_ambiguous_when_text_is_missing_but_pages_overlap() {
        let page = DynamicImage::new_rgb8(32, 32);
        let page_hash = dhash_image(&page);

        let repo = InMemoryRepository::new();
        repo.insert_record(sample_record(5, vec![page_hash, page_hash], None)).unwrap();

        let signer = StubSigner(SignatureVerdict::default());
        let rasterizer = StubRasterizer { text: String::new(), pages: vec![page.clone(), page] };
        let cfg = DocumentVerifierConfig::default();
        let ocr_cfg = OcrConfig::default();

        let outcome = verify_document(b"query bytes", &cfg, &ocr_cfg, &repo, &signer, &rasterizer);
        assert!(!outcome.valid);
        assert_eq!(outcome.method, Some(DocumentVerifyMethod::PerceptualPdfAmbiguous));
        assert_eq!(outcome.reason.as_deref(), Some("no_query_text"));
    }
}
