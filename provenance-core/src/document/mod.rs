//! Multi-signal document and image verification.
//!
//! Dispatches an uploaded artifact to the image path (watermark extraction,
//! falling back to perceptual-hash similarity) or the document path
//! (PAdES signature lookup, falling back to perceptual + text matching),
//! based on filename extension and declared MIME type.

pub mod document_path;
pub mod image_path;
pub mod rank;

pub use document_path::{DocumentVerifyMethod, DocumentVerifyOutcome, SimilarityDiagnostics, verify_document};
pub use image_path::{ImageVerifyOutcome, PerceptualFallback, verify_image};

use crate::config::{DocumentVerifierConfig, OcrConfig, WatermarkConfig};
use crate::ocr::DocumentRasterizer;
use crate::repository::Repository;
use crate::signer::Signer;

/// Either branch of the verifier's dispatch.
#[derive(Debug)]
pub enum VerifyOutcome {
    Image(ImageVerifyOutcome),
    Document(DocumentVerifyOutcome),
}

/// Verifies an uploaded artifact, dispatching on `filename`/`mime_type`.
pub fn verify(
    bytes: &[u8],
    filename: &str,
    mime_type: &str,
    watermark_cfg: &WatermarkConfig,
    doc_cfg: &DocumentVerifierConfig,
    ocr_cfg: &OcrConfig,
    repo: &dyn Repository,
    signer: &dyn Signer,
    rasterizer: &dyn DocumentRasterizer,
) -> VerifyOutcome {
    if is_document(filename, mime_type) {
        VerifyOutcome::Document(verify_document(bytes, doc_cfg, ocr_cfg, repo, signer, rasterizer))
    } else {
        VerifyOutcome::Image(verify_image(bytes, watermark_cfg, doc_cfg, repo))
    }
}

fn is_document(filename: &str, mime_type: &str) -> bool {
    filename.to_lowercase().ends_with(".pdf") || mime_type.eq_ignore_ascii_case("application/pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_on_pdf_extension_regardless_of_case() {
        assert!(is_document("Report.PDF", "application/octet-stream"));
        assert!(is_document("report.pdf", ""));
    }

    #[test]
    fn dispatches_on_declared_mime_type() {
        assert!(is_document("upload.bin", "application/pdf"));
        assert!(!is_document("photo.jpg", "image/jpeg"));
    }
}
