//! Shared application state.

use std::sync::Arc;

use provenance_core::{DocumentRasterizer, MetricsRegistry, ProvenanceConfig, Repository, Signer};

/// Shared state held by request handlers via Axum's `State` extractor.
pub struct AppState {
    /// Durable storage for issuance records.
    pub repository: Arc<dyn Repository>,
    /// External signature-verification client.
    pub signer: Arc<dyn Signer>,
    /// External OCR/rasterization client.
    pub rasterizer: Arc<dyn DocumentRasterizer>,
    /// Watermark, document-verifier, and external-client configuration.
    pub config: ProvenanceConfig,
    /// Metrics registry shared between the pipeline and the API.
    pub metrics: Arc<MetricsRegistry>,
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;
