//! Core forensic identification library.
//!
//! This crate provides the building blocks for content-provenance
//! identification across two media:
//!
//! - frequency-domain image watermarking: DCT/QIM embedding over anchored,
//!   redundant regions, Reed-Solomon + HMAC payload authentication, and a
//!   parameter-search extractor robust to crop/recompression (`dct`,
//!   `block_coder`, `region`, `codec`, `watermark`);
//! - multi-signal document verification: PAdES signature lookup and
//!   perceptual-hash + text-SimHash matching (`document`, `fingerprint`,
//!   `semantic`);
//! - the external collaborators both rely on (`signer`, `ocr`);
//! - durable storage of issuance records (`repository`, `types`);
//! - the issuance pipeline tying all of the above together (`ingest`);
//! - ambient configuration, error handling, and metrics (`config`,
//!   `error`, `metrics`).
//!
//! Higher-level binaries (the HTTP gateway) compose these pieces into an
//! ingest/verify API.

pub mod block_coder;
pub mod canonical;
pub mod codec;
pub mod config;
pub mod dct;
pub mod document;
pub mod error;
pub mod fingerprint;
pub mod ids;
pub mod ingest;
pub mod metrics;
pub mod ocr;
pub mod region;
pub mod repository;
pub mod semantic;
pub mod signer;
pub mod types;
pub mod watermark;

// Re-export top-level configuration types.
pub use config::{DocumentVerifierConfig, MetricsConfig, OcrConfig, ProvenanceConfig, SignerConfig, WatermarkConfig};

// Re-export the error taxonomy.
pub use error::ProvenanceError;

// Re-export id minting and token normalization.
pub use ids::{WatermarkToken, canonical_metadata_hash, lookup_by_token, mint_watermark_id, normalize_watermark_token};

// Re-export the issuance pipeline.
pub use ingest::{DocumentIngestOutcome, DocumentIngestRequest, ImageIngestOutcome, ImageIngestRequest, ingest_document, ingest_image};

// Re-export the document/image verification dispatch.
pub use document::{DocumentVerifyOutcome, ImageVerifyOutcome, VerifyOutcome, verify};

// Re-export storage.
pub use repository::{InMemoryRepository, Repository};

// Re-export external collaborator contracts.
pub use ocr::{DocumentRasterizer, HttpOcrClient, OcrError};
pub use signer::{HttpSigner, Signer, SignatureVerdict, SignerError};

// Re-export metrics registry.
pub use metrics::{MetricsRegistry, ProvenanceMetrics, run_prometheus_http_server};

// Re-export domain types at the crate root for convenience.
pub use types::*;
