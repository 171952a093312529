//! Issuance pipeline: mints an identity, embeds or records the evidence
//! that corroborates it, and persists the resulting [`ProvenanceRecord`].

use chrono::Utc;
use serde_json::Value;

use crate::config::{OcrConfig, WatermarkConfig};
use crate::error::ProvenanceError;
use crate::fingerprint::{dhash, simhash64};
use crate::ids::{canonical_metadata_hash, mint_watermark_id};
use crate::ocr::DocumentRasterizer;
use crate::repository::Repository;
use crate::signer::Signer;
use crate::types::record::ProvenanceRecord;
use crate::types::{Sha256Hash, WatermarkId};
use crate::watermark;

/// Algorithm version recorded for every newly issued record. Bumped only
/// when the wire payload or codec changes in a way that affects decoding
/// of previously issued artifacts.
pub const CURRENT_ALGO_VERSION: u8 = 2;

/// Inputs for watermarking and issuing provenance for an image.
pub struct ImageIngestRequest<'a> {
    pub user_id: &'a str,
    pub original_filename: &'a str,
    pub mime_type: &'a str,
    pub bytes: &'a [u8],
    pub metadata: Value,
}

/// Result of a successful image issuance.
pub struct ImageIngestOutcome {
    pub watermark_id: WatermarkId,
    pub watermarked_bytes: Vec<u8>,
    pub record: ProvenanceRecord,
}

/// Embeds a fresh watermark into `req.bytes`, fingerprints the result, and
/// persists the issuance record.
pub fn ingest_image(
    req: ImageIngestRequest<'_>,
    watermark_cfg: &WatermarkConfig,
    repo: &dyn Repository,
) -> Result<ImageIngestOutcome, ProvenanceError> {
    let id = mint_watermark_id();
    let watermarked_bytes = watermark::embed(req.bytes, &id, watermark_cfg)?;
    let perceptual_hash = dhash(&watermarked_bytes).ok();
    let metadata_hash = canonical_metadata_hash(&req.metadata);

    let record = ProvenanceRecord {
        id,
        user_id: req.user_id.to_string(),
        original_filename: req.original_filename.to_string(),
        stored_filename: format!("{}.{}", id.code().0, extension_for(req.mime_type)),
        mime_type: req.mime_type.to_string(),
        original_file_hash: Sha256Hash::compute(req.bytes),
        watermark_id: id,
        watermark_code: id.code(),
        perceptual_hash,
        pdf_text_simhash: None,
        metadata: req.metadata,
        metadata_hash,
        per_page_hashes: Vec::new(),
        signed_at: None,
        signer_cert_thumbprint: None,
        issued_at: Utc::now(),
        source_created_at: None,
        algo_version: CURRENT_ALGO_VERSION,
    };

    repo.insert_record(record.clone())?;
    Ok(ImageIngestOutcome { watermark_id: id, watermarked_bytes, record })
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        _ => "bin",
    }
}

/// Inputs for recording provenance for an already-signed document.
pub struct DocumentIngestRequest<'a> {
    pub user_id: &'a str,
    pub original_filename: &'a str,
    pub bytes: &'a [u8],
    pub metadata: Value,
}

/// Result of a successful document issuance.
pub struct DocumentIngestOutcome {
    pub watermark_id: WatermarkId,
    pub record: ProvenanceRecord,
}

/// Records provenance for a document that has already been signed
/// upstream: verifies the embedded signature to capture its thumbprint,
/// fingerprints the rendered pages and extracted text, and persists the
/// issuance record.
pub fn ingest_document(
    req: DocumentIngestRequest<'_>,
    signer: &dyn Signer,
    rasterizer: &dyn DocumentRasterizer,
    ocr_cfg: &OcrConfig,
    repo: &dyn Repository,
) -> Result<DocumentIngestOutcome, ProvenanceError> {
    let id = mint_watermark_id();

    let (signed_at, signer_cert_thumbprint) = match signer.verify(req.bytes) {
        Ok(verdict) if verdict.intact => (Some(Utc::now()), verdict.leaf_thumbprint_sha256),
        _ => (None, None),
    };

    let per_page_hashes = rasterizer
        .render_pages_rgb(req.bytes, ocr_cfg.dpi, ocr_cfg.max_pages)
        .map(|pages| pages.iter().map(crate::fingerprint::dhash_image).collect())
        .unwrap_or_default();

    let pdf_text_simhash = rasterizer
        .extract_text(req.bytes, ocr_cfg.max_pages)
        .ok()
        .and_then(|text| simhash64(&text));

    let metadata_hash = canonical_metadata_hash(&req.metadata);

    let record = ProvenanceRecord {
        id,
        user_id: req.user_id.to_string(),
        original_filename: req.original_filename.to_string(),
        stored_filename: format!("{}.pdf", id.code().0),
        mime_type: "application/pdf".to_string(),
        original_file_hash: Sha256Hash::compute(req.bytes),
        watermark_id: id,
        watermark_code: id.code(),
        perceptual_hash: None,
        pdf_text_simhash,
        metadata: req.metadata,
        metadata_hash,
        per_page_hashes,
        signed_at,
        signer_cert_thumbprint,
        issued_at: Utc::now(),
        source_created_at: None,
        algo_version: CURRENT_ALGO_VERSION,
    };

    repo.insert_record(record.clone())?;
    Ok(DocumentIngestOutcome { watermark_id: id, record })
}
