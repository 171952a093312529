//! Prometheus-backed metrics and HTTP exporter.
//!
//! This module defines a [`MetricsRegistry`] that owns a Prometheus
//! registry and a set of strongly-typed provenance metrics, and an
//! async HTTP exporter that serves `/metrics` using `hyper`.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder,
};

/// Watermark and verification metrics.
///
/// These are registered into a [`Registry`] and updated from the
/// watermark embed/extract and verification pipelines.
#[derive(Clone)]
pub struct ProvenanceMetrics {
    /// Latency of embedding a watermark into an image, in seconds.
    pub watermark_embed_seconds: Histogram,
    /// Latency of extracting a watermark from an image, in seconds.
    pub watermark_extract_seconds: Histogram,
    /// Number of extraction attempts where Reed-Solomon decoding failed on
    /// every parameter combination tried.
    pub ecc_decode_failures_total: IntCounter,
    /// Number of document verifications whose outcome was ambiguous
    /// (multiple candidates cleared the acceptance gate).
    pub verifications_ambiguous_total: IntCounter,
    /// Number of document verifications rejected outright (no candidate
    /// cleared the acceptance gate).
    pub verifications_rejected_total: IntCounter,
    /// Number of document verifications accepted unambiguously.
    pub verifications_accepted_total: IntCounter,
}

impl ProvenanceMetrics {
    /// Registers provenance metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let watermark_embed_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "provenance_watermark_embed_seconds",
                "Time to embed a watermark into an image in seconds",
            )
            .buckets(vec![
                0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
        )?;
        registry.register(Box::new(watermark_embed_seconds.clone()))?;

        let watermark_extract_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "provenance_watermark_extract_seconds",
                "Time to extract a watermark from an image in seconds, including parameter search",
            )
            .buckets(vec![
                0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0,
            ]),
        )?;
        registry.register(Box::new(watermark_extract_seconds.clone()))?;

        let ecc_decode_failures_total = IntCounter::with_opts(Opts::new(
            "provenance_ecc_decode_failures_total",
            "Total number of watermark extractions where ECC decoding failed on every parameter combination",
        ))?;
        registry.register(Box::new(ecc_decode_failures_total.clone()))?;

        let verifications_ambiguous_total = IntCounter::with_opts(Opts::new(
            "provenance_verifications_ambiguous_total",
            "Total number of document verifications with more than one candidate clearing the acceptance gate",
        ))?;
        registry.register(Box::new(verifications_ambiguous_total.clone()))?;

        let verifications_rejected_total = IntCounter::with_opts(Opts::new(
            "provenance_verifications_rejected_total",
            "Total number of document verifications where no candidate cleared the acceptance gate",
        ))?;
        registry.register(Box::new(verifications_rejected_total.clone()))?;

        let verifications_accepted_total = IntCounter::with_opts(Opts::new(
            "provenance_verifications_accepted_total",
            "Total number of document verifications accepted unambiguously",
        ))?;
        registry.register(Box::new(verifications_accepted_total.clone()))?;

        Ok(Self {
            watermark_embed_seconds,
            watermark_extract_seconds,
            ecc_decode_failures_total,
            verifications_ambiguous_total,
            verifications_rejected_total,
            verifications_accepted_total,
        })
    }
}

/// Wrapper around a Prometheus registry and the provenance metrics.
///
/// This is the main handle you pass around in the gateway. It can be
/// wrapped in an [`Arc`] and shared across threads/tasks.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub provenance: ProvenanceMetrics,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with a fresh underlying `Registry`
    /// and registers the provenance metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("provenance".to_string()), None)?;
        let provenance = ProvenanceMetrics::register(&registry)?;
        Ok(Self {
            registry,
            provenance,
        })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!(error = %e, "failed to encode Prometheus metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Runs an HTTP server that exposes Prometheus metrics.
///
/// The server listens on `addr` and serves `GET /metrics` with the
/// Prometheus text exposition format. All other paths return 404.
///
/// This function is `async` and is intended to be spawned onto a Tokio
/// runtime, e.g.:
///
/// ```ignore
/// let registry = Arc::new(MetricsRegistry::new()?);
/// let addr: SocketAddr = "127.0.0.1:9899".parse()?;
/// tokio::spawn(run_prometheus_http_server(registry.clone(), addr));
/// ```
pub async fn run_prometheus_http_server(
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_request(req, metrics)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                tracing::warn!(error = %err, "prometheus HTTP server connection error");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let body = metrics.gather_text();
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
                .body(Full::new(Bytes::from(body)))
                .unwrap())
        }
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("not found")))
            .unwrap()),
    }
}
