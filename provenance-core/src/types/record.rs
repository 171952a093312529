//! The immutable provenance record and its metadata projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Fingerprint64, Sha256Hash, WatermarkCode, WatermarkId};

/// One immutable row describing a single issuance.
///
/// A record is created only after the artifact is durably produced and is
/// never mutated thereafter.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub id: WatermarkId,
    pub user_id: String,
    pub original_filename: String,
    pub stored_filename: String,
    pub mime_type: String,

    /// SHA-256 of the produced bytes for documents, of the uploaded bytes
    /// for images.
    pub original_file_hash: Sha256Hash,

    pub watermark_id: WatermarkId,
    pub watermark_code: WatermarkCode,

    /// dHash of the watermarked output; `None` for documents.
    pub perceptual_hash: Option<Fingerprint64>,

    /// SimHash of extracted/embedded text; `None` if insufficient text.
    pub pdf_text_simhash: Option<Fingerprint64>,

    /// Arbitrary caller-supplied metadata (title, author, organisation...).
    pub metadata: Value,

    /// SHA-256 of the canonical (sorted-key, whitespace-free) JSON encoding
    /// of `metadata`. A pure function of `metadata`.
    pub metadata_hash: Sha256Hash,

    /// Per-page dHashes, ordered, for up to the first 10 pages of a document.
    pub per_page_hashes: Vec<Fingerprint64>,

    pub signed_at: Option<DateTime<Utc>>,
    pub signer_cert_thumbprint: Option<Sha256Hash>,

    pub issued_at: DateTime<Utc>,
    pub source_created_at: Option<DateTime<Utc>>,
    pub algo_version: u8,
}

impl ProvenanceRecord {
    /// Looks up a string-valued field out of the free-form `metadata` blob.
    pub fn metadata_field(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Flattens the handful of metadata fields the document verifier's
    /// OCR-similarity diagnostics and API responses care about.
    pub fn common_metadata_fields(&self) -> CommonMetadataFields {
        CommonMetadataFields {
            title: self.metadata_field("title").map(str::to_string),
            author: self.metadata_field("author").map(str::to_string),
            organization: self.metadata_field("organization").map(str::to_string),
            created_date: self.metadata_field("createdDate").map(str::to_string),
        }
    }
}

/// UI/diagnostic-convenience projection of a record's `metadata` blob:
/// the four fields compared against OCR'd document text for the
/// similarity diagnostic.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CommonMetadataFields {
    pub title: Option<String>,
    pub author: Option<String>,
    pub organization: Option<String>,
    pub created_date: Option<String>,
}
