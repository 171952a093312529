//! In-memory repository.
//!
//! Useful for unit tests, demos, and the gateway's default configuration
//! when no external database is wired up. Keeps all records in memory
//! behind a `RwLock`, indexed by watermark id and by original file hash,
//! with insertion order tracked separately for recency scans.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::ProvenanceError;
use crate::types::record::ProvenanceRecord;
use crate::types::{Sha256Hash, WatermarkCode, WatermarkId};

use super::Repository;

#[derive(Default)]
struct Inner {
    records: HashMap<WatermarkId, ProvenanceRecord>,
    by_hash: HashMap<Sha256Hash, WatermarkId>,
    by_code: HashMap<WatermarkCode, WatermarkId>,
    by_thumbprint: HashMap<Sha256Hash, Vec<WatermarkId>>,
    /// Insertion order, oldest first.
    order: Vec<WatermarkId>,
}

/// In-memory implementation of [`Repository`].
#[derive(Default)]
pub struct InMemoryRepository {
    inner: RwLock<Inner>,
}

impl InMemoryRepository {
    /// Creates a new, empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().expect("repository lock poisoned").records.len()
    }

    /// Returns `true` if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Repository for InMemoryRepository {
    fn insert_record(&self, record: ProvenanceRecord) -> Result<(), ProvenanceError> {
        let mut inner = self.inner.write().expect("repository lock poisoned");
        if inner.records.contains_key(&record.id) || inner.by_code.contains_key(&record.watermark_code) {
            return Err(ProvenanceError::Internal(format!(
                "duplicate watermark id/code for {}",
                record.watermark_code
            )));
        }
        inner.by_hash.insert(record.original_file_hash, record.id);
        inner.by_code.insert(record.watermark_code.clone(), record.id);
        if let Some(thumb) = record.signer_cert_thumbprint {
            inner.by_thumbprint.entry(thumb).or_default().push(record.id);
        }
        inner.order.push(record.id);
        inner.records.insert(record.id, record);
        Ok(())
    }

    fn find_record_by_watermark_id(
        &self,
        id: &WatermarkId,
    ) -> Result<Option<ProvenanceRecord>, ProvenanceError> {
        let inner = self.inner.read().expect("repository lock poisoned");
        Ok(inner.records.get(id).cloned())
    }

    fn find_record_by_watermark_code(
        &self,
        code: &WatermarkCode,
    ) -> Result<Option<ProvenanceRecord>, ProvenanceError> {
        let inner = self.inner.read().expect("repository lock poisoned");
        Ok(inner
            .by_code
            .get(code)
            .and_then(|id| inner.records.get(id))
            .cloned())
    }

    fn find_record_by_original_hash(
        &self,
        hash: &Sha256Hash,
    ) -> Result<Option<ProvenanceRecord>, ProvenanceError> {
        let inner = self.inner.read().expect("repository lock poisoned");
        Ok(inner
            .by_hash
            .get(hash)
            .and_then(|id| inner.records.get(id))
            .cloned())
    }

    fn find_records_by_signer_thumbprint(
        &self,
        thumbprint: &Sha256Hash,
    ) -> Result<Vec<ProvenanceRecord>, ProvenanceError> {
        let inner = self.inner.read().expect("repository lock poisoned");
        Ok(inner
            .by_thumbprint
            .get(thumbprint)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.records.get(id))
            .cloned()
            .collect())
    }

    fn scan_recent_with_perceptual_hash(
        &self,
        limit: usize,
    ) -> Result<Vec<ProvenanceRecord>, ProvenanceError> {
        let inner = self.inner.read().expect("repository lock poisoned");
        Ok(inner
            .order
            .iter()
            .rev()
            .filter_map(|id| inner.records.get(id))
            .filter(|r| r.perceptual_hash.is_some())
            .take(limit)
            .cloned()
            .collect())
    }

    fn scan_recent_with_per_page_hashes(
        &self,
        limit: usize,
    ) -> Result<Vec<ProvenanceRecord>, ProvenanceError> {
        let inner = self.inner.read().expect("repository lock poisoned");
        Ok(inner
            .order
            .iter()
            .rev()
            .filter_map(|id| inner.records.get(id))
            .filter(|r| !r.per_page_hashes.is_empty())
            .take(limit)
            .cloned()
            .collect())
    }
}
