//! Top-level configuration for the provenance pipeline.
//!
//! This module aggregates configuration for:
//!
//! - the watermark codec and embedder/extractor (`WatermarkConfig`),
//! - the document verifier's acceptance gate (`DocumentVerifierConfig`),
//! - the external signer client (`SignerConfig`),
//! - the external OCR/rasterization client (`OcrConfig`),
//! - the metrics exporter (`MetricsConfig`).
//!
//! The goal is a single `ProvenanceConfig` that higher-level binaries can
//! construct from defaults, a config file, or environment variables.

use std::net::SocketAddr;
use std::time::Duration;

/// Environment variable holding the HMAC/RNG-seed secret.
///
/// An empty or missing value resolves to [`WatermarkConfig::FALLBACK_SECRET`]
/// at construction time; the secret is never read lazily from the
/// environment once a `WatermarkConfig` exists.
pub const SECRET_ENV_VAR: &str = "PROVENANCE_SECRET";

/// Configuration for the watermark codec, embedder, and extractor.
#[derive(Clone, Debug)]
pub struct WatermarkConfig {
    /// Process-wide HMAC/RNG-seed secret. Resolved once at construction;
    /// never empty.
    pub secret: String,
    /// Default QIM quantization step used by the embedder.
    pub strength: f32,
    /// Default redundancy budget split across anchored regions.
    pub repeats: usize,
}

impl WatermarkConfig {
    /// Fallback secret used when the environment does not provide one, so
    /// dev/test deployments without `PROVENANCE_SECRET` set remain
    /// internally consistent between embed and extract.
    pub const FALLBACK_SECRET: &'static str = "supersecret";

    /// Builds a `WatermarkConfig` from the environment, falling back to
    /// [`Self::FALLBACK_SECRET`] when `PROVENANCE_SECRET` is unset or empty.
    pub fn from_env() -> Self {
        let secret = std::env::var(SECRET_ENV_VAR)
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Self::FALLBACK_SECRET.to_string());

        Self {
            secret,
            ..Self::default()
        }
    }
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            secret: Self::FALLBACK_SECRET.to_string(),
            strength: 14.0,
            repeats: 8,
        }
    }
}

/// Configuration for the document verifier's perceptual + text acceptance
/// gate.
#[derive(Clone, Debug)]
pub struct DocumentVerifierConfig {
    /// Minimum fraction of query pages that must find a matching candidate
    /// page (tightened from an earlier, looser value; see design notes).
    pub min_overlap_score: f64,
    /// Minimum average-distance score required when `query_pages > 2`.
    pub min_dist_score: f64,
    /// Minimum average-distance score required when `query_pages == 2`.
    pub min_dist_score_two_page: f64,
    /// Maximum per-page Hamming distance (out of 64 bits) for a page to
    /// count as a match.
    pub page_match_max_distance: u32,
    /// Maximum text SimHash Hamming distance for the text gate to pass.
    pub max_text_distance: u32,
    /// Minimum number of query pages required to ever auto-attribute
    /// ownership from perceptual + text evidence alone.
    pub min_query_pages: usize,
    /// How many of the most-recent records to scan for a perceptual/text
    /// match or a signature thumbprint fallback.
    pub recent_scan_limit: usize,
    /// Image-path fallback: confidence below this is flagged as tamper-suspected.
    pub image_tamper_confidence_floor: f64,
    /// Image-path fallback: maximum dHash distance to report a possible match.
    pub image_fallback_max_distance: u32,
    /// Image-path fallback: minimum gap between best and second-best match.
    pub image_fallback_min_gap: u32,
}

impl Default for DocumentVerifierConfig {
    fn default() -> Self {
        Self {
            // Tightened from 0.4 in earlier revisions of the source system;
            // later revisions use the stricter value and so do we.
            min_overlap_score: 0.8,
            min_dist_score: 0.82,
            min_dist_score_two_page: 0.85,
            page_match_max_distance: 16,
            max_text_distance: 12,
            min_query_pages: 2,
            recent_scan_limit: 500,
            image_tamper_confidence_floor: 0.55,
            image_fallback_max_distance: 10,
            image_fallback_min_gap: 2,
        }
    }
}

/// Configuration for the external document-signer client.
#[derive(Clone, Debug)]
pub struct SignerConfig {
    /// Base URL of the signer service.
    pub base_url: String,
    /// Request timeout for sign/verify calls.
    pub timeout: Duration,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8090".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Configuration for the external OCR/rasterization client.
#[derive(Clone, Debug)]
pub struct OcrConfig {
    /// Base URL of the OCR/rasterization service.
    pub base_url: String,
    /// Request timeout for OCR/rasterization calls.
    pub timeout: Duration,
    /// Maximum number of pages rasterized/OCR'd per document.
    pub max_pages: usize,
    /// Rasterization resolution in dots-per-inch.
    pub dpi: u32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8091".to_string(),
            timeout: Duration::from_secs(20),
            max_pages: 10,
            dpi: 150,
        }
    }
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Whether to run a `/metrics` HTTP exporter.
    pub enabled: bool,
    /// Address to bind the metrics HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        // Safe to unwrap: this is a fixed, valid address literal.
        let addr: SocketAddr = "127.0.0.1:9899"
            .parse()
            .expect("hard-coded metrics listen address should parse");
        Self {
            enabled: true,
            listen_addr: addr,
        }
    }
}

/// Top-level configuration for the provenance pipeline.
#[derive(Clone, Debug, Default)]
pub struct ProvenanceConfig {
    pub watermark: WatermarkConfig,
    pub document_verifier: DocumentVerifierConfig,
    pub signer: SignerConfig,
    pub ocr: OcrConfig,
    pub metrics: MetricsConfig,
}

impl ProvenanceConfig {
    /// Builds a `ProvenanceConfig`, resolving the HMAC/RNG secret from the
    /// environment and leaving everything else at its default.
    pub fn from_env() -> Self {
        Self {
            watermark: WatermarkConfig::from_env(),
            ..Self::default()
        }
    }
}
