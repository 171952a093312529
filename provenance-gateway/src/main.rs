//! Gateway binary.
//!
//! This binary exposes a small HTTP API on top of the `provenance-core`
//! forensic identification pipeline:
//!
//! - `POST /ingest/image` — embed a watermark and record its issuance.
//! - `POST /ingest/document` — record provenance for an already-signed
//!   document.
//! - `POST /verify` — multi-signal verification of an uploaded artifact.
//! - `GET /verify/{token}` — plain lookup by watermark code or id.
//! - `GET /health`
//!
//! It wires an in-memory repository, HTTP signer/OCR clients, and a
//! Prometheus metrics exporter on `/metrics`.

mod config;
mod routes;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;

use provenance_core::{HttpOcrClient, HttpSigner, InMemoryRepository, MetricsRegistry, ProvenanceConfig, run_prometheus_http_server};

use config::GatewayConfig;
use routes::{health, ingest, verify};
use state::{AppState, SharedState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "provenance_gateway=info,provenance_core=info".to_string()),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let gateway_cfg = GatewayConfig::default();
    let provenance_cfg = ProvenanceConfig::from_env();

    // ---------------------------
    // Metrics
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new().map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    if provenance_cfg.metrics.enabled {
        let metrics_clone = metrics.clone();
        let addr = provenance_cfg.metrics.listen_addr;
        tokio::spawn(async move {
            if let Err(e) = run_prometheus_http_server(metrics_clone, addr).await {
                eprintln!("metrics HTTP server error: {e}");
            }
        });
        tracing::info!("metrics exporter listening on http://{}/metrics", addr);
    }

    // ---------------------------
    // External collaborators + storage
    // ---------------------------

    let repository = Arc::new(InMemoryRepository::new());

    let signer = Arc::new(
        HttpSigner::new(provenance_cfg.signer.base_url.clone(), provenance_cfg.signer.timeout)
            .map_err(|e| format!("failed to create signer client: {e}"))?,
    );

    let rasterizer = Arc::new(
        HttpOcrClient::new(provenance_cfg.ocr.base_url.clone(), provenance_cfg.ocr.timeout)
            .map_err(|e| format!("failed to create OCR/rasterization client: {e}"))?,
    );

    // ---------------------------
    // Shared state
    // ---------------------------

    let app_state: SharedState = Arc::new(AppState {
        repository,
        signer,
        rasterizer,
        config: provenance_cfg,
        metrics: metrics.clone(),
    });

    // ---------------------------
    // HTTP router
    // ---------------------------

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/ingest/image", post(ingest::ingest_image_route))
        .route("/ingest/document", post(ingest::ingest_document_route))
        .route("/verify", post(verify::verify_route))
        .route("/verify/{token}", get(verify::lookup_route))
        .with_state(app_state);

    tracing::info!("gateway listening on http://{}", gateway_cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(gateway_cfg.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", gateway_cfg.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("gateway server error: {e}"))?;

    Ok(())
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
