//! Durable storage for [`ProvenanceRecord`]s.
//!
//! This module defines the [`Repository`] trait implemented against
//! whatever backing store a deployment chooses, and ships
//! [`mem::InMemoryRepository`] for tests and small deployments.

pub mod mem;

pub use mem::InMemoryRepository;

use crate::error::ProvenanceError;
use crate::types::record::ProvenanceRecord;
use crate::types::{Sha256Hash, WatermarkCode, WatermarkId};

/// Storage abstraction over provenance records.
///
/// Implementations are responsible for durability; this trait only
/// specifies the query/insert shapes the ingest and verify pipelines need.
pub trait Repository: Send + Sync {
    /// Inserts a freshly-issued record. Records are immutable once
    /// inserted; no update/delete is exposed.
    fn insert_record(&self, record: ProvenanceRecord) -> Result<(), ProvenanceError>;

    /// Looks up a record by its watermark id (the identity extracted from
    /// an image's embedded payload, or resolved from a watermark code).
    fn find_record_by_watermark_id(
        &self,
        id: &WatermarkId,
    ) -> Result<Option<ProvenanceRecord>, ProvenanceError>;

    /// Looks up a record by its short watermark code (the `lookup_by_token`
    /// path, for callers that only have `WMK-XXXXXXXXXXXX`).
    fn find_record_by_watermark_code(
        &self,
        code: &WatermarkCode,
    ) -> Result<Option<ProvenanceRecord>, ProvenanceError>;

    /// Looks up a record by the SHA-256 of the exact bytes it was issued
    /// for (the document verifier's fast path: byte-identical re-upload).
    fn find_record_by_original_hash(
        &self,
        hash: &Sha256Hash,
    ) -> Result<Option<ProvenanceRecord>, ProvenanceError>;

    /// Looks up all records sharing a signer certificate thumbprint (the
    /// document verifier's fallback path: only usable when exactly one
    /// record matches).
    fn find_records_by_signer_thumbprint(
        &self,
        thumbprint: &Sha256Hash,
    ) -> Result<Vec<ProvenanceRecord>, ProvenanceError>;

    /// Returns up to `limit` of the most recently issued records that carry
    /// a perceptual hash, most recent first (the image verifier's
    /// candidate pool).
    fn scan_recent_with_perceptual_hash(
        &self,
        limit: usize,
    ) -> Result<Vec<ProvenanceRecord>, ProvenanceError>;

    /// Returns up to `limit` of the most recently issued records that carry
    /// per-page hashes, most recent first (the document verifier's
    /// candidate pool when no exact byte match exists).
    fn scan_recent_with_per_page_hashes(
        &self,
        limit: usize,
    ) -> Result<Vec<ProvenanceRecord>, ProvenanceError>;
}
