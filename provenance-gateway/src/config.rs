//! Gateway configuration.
//!
//! This only configures the HTTP listen address; everything else (the
//! watermark codec, the document verifier's acceptance gate, the signer
//! and OCR client endpoints, metrics) comes from
//! `provenance_core::ProvenanceConfig::from_env()`.

use std::net::SocketAddr;

/// Configuration for the gateway's own HTTP server.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let addr: SocketAddr = "0.0.0.0:8081"
            .parse()
            .expect("hard-coded gateway listen address should parse");
        Self { listen_addr: addr }
    }
}
