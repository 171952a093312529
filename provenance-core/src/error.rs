//! Error taxonomy for the forensic identification pipeline.
//!
//! A single [`ProvenanceError`] enum is used across the watermark codec,
//! the image watermarker, and the document verifier. Each channel in the
//! document verifier (signature, perceptual, text) is expected to degrade
//! independently rather than propagate a hard error: only
//! [`ProvenanceError::Internal`] and [`ProvenanceError::InvalidInput`]
//! represent "could not even attempt verification".

use std::fmt;

/// Errors that can occur while embedding, extracting, or verifying
/// provenance evidence.
#[derive(Debug)]
pub enum ProvenanceError {
    /// Unreadable image/document, unsupported format, or an image too
    /// small to carry a watermark.
    InvalidInput(String),
    /// A payload's HMAC tag (or version byte) did not authenticate.
    InvalidSignature,
    /// Reed-Solomon decoding failed after the extractor exhausted its
    /// parameter search.
    EccFailure,
    /// The evidence was sound but no matching record exists.
    NotFound(String),
    /// The evidence matches more than one record and cannot be resolved
    /// without guessing.
    Ambiguous(String),
    /// An external collaborator (signer, OCR, rasterizer) failed or timed
    /// out; the caller should continue with whatever other evidence it has.
    Degraded(String),
    /// Anything else unexpected.
    Internal(String),
}

impl fmt::Display for ProvenanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvenanceError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            ProvenanceError::InvalidSignature => {
                write!(f, "invalid watermark signature")
            }
            ProvenanceError::EccFailure => write!(f, "watermark decode failed"),
            ProvenanceError::NotFound(msg) => write!(f, "not found: {msg}"),
            ProvenanceError::Ambiguous(msg) => write!(f, "ambiguous: {msg}"),
            ProvenanceError::Degraded(msg) => write!(f, "degraded: {msg}"),
            ProvenanceError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for ProvenanceError {}
