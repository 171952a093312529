//! Core domain types used across the provenance pipeline.
//!
//! This module defines strongly-typed hashes and identifiers so that
//! watermark ids, content hashes, and fingerprints are not passed around
//! as naked `String`/`Vec<u8>` values.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Provenance records and the common-metadata projection used by the
/// document verifier.
pub mod record;

pub use record::{CommonMetadataFields, ProvenanceRecord};

/// Length in bytes of a SHA-256 digest.
pub const SHA256_LEN: usize = 32;

/// Strongly-typed SHA-256 digest.
///
/// Used as the backing representation for content hashes, metadata
/// hashes, and signer certificate thumbprints throughout the pipeline.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Sha256Hash(pub [u8; SHA256_LEN]);

impl Sha256Hash {
    /// Computes the SHA-256 digest of `data`.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let digest = hasher.finalize();
        let mut out = [0u8; SHA256_LEN];
        out.copy_from_slice(&digest);
        Sha256Hash(out)
    }

    /// Returns the lowercase hex encoding of this digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a lowercase (or uppercase) hex string into a `Sha256Hash`.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let mut out = [0u8; SHA256_LEN];
        if bytes.len() != SHA256_LEN {
            // hex::decode already validates hex-ness; length mismatches
            // surface as an odd-length-style error for a uniform API.
            return Err(hex::FromHexError::InvalidStringLength);
        }
        out.copy_from_slice(&bytes);
        Ok(Sha256Hash(out))
    }
}

impl std::fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sha256Hash({})", self.to_hex())
    }
}

/// 128-bit watermark identifier, minted uniformly at random per issuance.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct WatermarkId(pub [u8; 16]);

impl WatermarkId {
    /// Returns the lowercase 32-hex-character encoding of this id.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a 32-hex-character string into a `WatermarkId`.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 16 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut out = [0u8; 16];
        out.copy_from_slice(&bytes);
        Ok(WatermarkId(out))
    }

    /// Derives the short, human-friendly watermark code for this id
    /// (`"WMK-" + uppercase(hex[:12])`).
    pub fn code(&self) -> WatermarkCode {
        let hex = self.to_hex();
        WatermarkCode(format!("WMK-{}", hex[..12].to_uppercase()))
    }
}

impl std::fmt::Debug for WatermarkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WatermarkId({})", self.to_hex())
    }
}

/// Human-friendly watermark code, one-way-derived from a [`WatermarkId`].
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct WatermarkCode(pub String);

impl std::fmt::Display for WatermarkCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 64-bit perceptual or text fingerprint, printed as 16 lowercase hex chars.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Fingerprint64(pub u64);

impl Fingerprint64 {
    /// Returns the 16-char lowercase hex encoding used in storage and on
    /// the wire.
    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }

    /// Parses a 16-hex-character string into a `Fingerprint64`.
    pub fn from_hex(s: &str) -> Result<Self, std::num::ParseIntError> {
        u64::from_str_radix(s, 16).map(Fingerprint64)
    }

    /// Hamming distance (number of differing bits) to another fingerprint.
    pub fn hamming(&self, other: &Fingerprint64) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

impl std::fmt::Debug for Fingerprint64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fingerprint64({})", self.to_hex())
    }
}
