//! Metrics and instrumentation for the provenance pipeline.
//!
//! This module defines Prometheus-compatible metrics for watermarking and
//! verification, and exposes a small HTTP exporter that serves `/metrics`
//! in Prometheus text format.
//!
//! Typical usage in the gateway:
//!
//! ```ignore
//! use std::net::SocketAddr;
//! use std::sync::Arc;
//! use provenance_core::metrics::{MetricsRegistry, run_prometheus_http_server};
//!
//! let registry = Arc::new(MetricsRegistry::new()?);
//! let addr: SocketAddr = "127.0.0.1:9899".parse()?;
//!
//! // Spawn the HTTP exporter in the background:
//! tokio::spawn(run_prometheus_http_server(registry.clone(), addr));
//!
//! // Elsewhere in the code:
//! registry.provenance.watermark_embed_seconds.observe(duration_secs);
//! ```

pub mod prometheus;

pub use prometheus::{MetricsRegistry, ProvenanceMetrics, run_prometheus_http_server};
