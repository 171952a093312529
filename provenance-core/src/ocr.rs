//! Client for the external OCR/rasterization service.
//!
//! PDF rasterization and text extraction are out-of-scope external
//! collaborators; this module specifies the contract the document
//! verifier and ingest pipeline consume, plus a small HTTP client
//! implementation: base URL, a bounded-timeout blocking client, and one
//! method per remote operation.

use std::time::Duration;

use image::DynamicImage;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

/// Errors that can occur while contacting the OCR/rasterization service.
#[derive(Debug)]
pub enum OcrError {
    /// Transport-level error (HTTP failure, timeout, connection refused).
    Transport(String),
    /// The service returned a malformed or unexpected response.
    Protocol(String),
}

impl std::fmt::Display for OcrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcrError::Transport(msg) => write!(f, "OCR/rasterization transport error: {msg}"),
            OcrError::Protocol(msg) => write!(f, "OCR/rasterization protocol error: {msg}"),
        }
    }
}

impl std::error::Error for OcrError {}

/// Abstract OCR/rasterization collaborator used by the document verifier
/// and the ingest pipeline.
///
/// Implementations are responsible for PDF parsing, page rendering, and
/// text extraction (embedded or OCR'd); the core pipeline only consumes
/// rendered RGB pages and plain-text strings.
pub trait DocumentRasterizer: Send + Sync {
    /// Extracts text from `document_bytes`, preferring embedded text and
    /// falling back to OCR, up to `max_pages` pages.
    fn extract_text(&self, document_bytes: &[u8], max_pages: usize) -> Result<String, OcrError>;

    /// Renders up to `max_pages` pages of `document_bytes` to RGB images
    /// at `dpi` dots-per-inch.
    fn render_pages_rgb(
        &self,
        document_bytes: &[u8],
        dpi: u32,
        max_pages: usize,
    ) -> Result<Vec<DynamicImage>, OcrError>;
}

/// Bounded-side thumbnail of a single rendered page. Not currently wired
/// into the verification path, which only needs per-page hashes, but kept
/// available for callers that want a preview image alongside a record.
pub fn render_page_thumbnail(page: &DynamicImage, max_side: u32) -> DynamicImage {
    let (w, h) = (page.width(), page.height());
    if w <= max_side && h <= max_side {
        return page.clone();
    }
    page.resize(max_side, max_side, image::imageops::FilterType::Lanczos3)
}

/// HTTP-based OCR/rasterization client.
pub struct HttpOcrClient {
    base_url: String,
    client: Client,
}

impl HttpOcrClient {
    /// Constructs a new HTTP OCR/rasterization client pointing at
    /// `base_url` (without a trailing slash), with the given timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, OcrError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OcrError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { base_url: base_url.into(), client })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ExtractTextQuery {
    max_pages: usize,
}

#[derive(Debug, Deserialize)]
struct ExtractTextResponse {
    text: String,
}

#[derive(Debug, Serialize)]
struct RenderPagesQuery {
    dpi: u32,
    max_pages: usize,
}

#[derive(Debug, Deserialize)]
struct RenderPagesResponse {
    /// Base64-encoded PNG bytes, one per rendered page, in page order.
    pages_png_base64: Vec<String>,
}

impl DocumentRasterizer for HttpOcrClient {
    fn extract_text(&self, document_bytes: &[u8], max_pages: usize) -> Result<String, OcrError> {
        let url = self.endpoint("/extract-text");
        let resp = self
            .client
            .post(&url)
            .query(&ExtractTextQuery { max_pages })
            .body(document_bytes.to_vec())
            .send()
            .map_err(|e| OcrError::Transport(format!("HTTP POST {url} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(OcrError::Transport(format!("OCR service returned HTTP status {}", resp.status())));
        }

        let body = resp
            .json::<ExtractTextResponse>()
            .map_err(|e| OcrError::Protocol(format!("failed to parse JSON response: {e}")))?;
        Ok(body.text)
    }

    fn render_pages_rgb(
        &self,
        document_bytes: &[u8],
        dpi: u32,
        max_pages: usize,
    ) -> Result<Vec<DynamicImage>, OcrError> {
        use base64::Engine;

        let url = self.endpoint("/render-pages");
        let resp = self
            .client
            .post(&url)
            .query(&RenderPagesQuery { dpi, max_pages })
            .body(document_bytes.to_vec())
            .send()
            .map_err(|e| OcrError::Transport(format!("HTTP POST {url} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(OcrError::Transport(format!("rasterization service returned HTTP status {}", resp.status())));
        }

        let body = resp
            .json::<RenderPagesResponse>()
            .map_err(|e| OcrError::Protocol(format!("failed to parse JSON response: {e}")))?;

        body.pages_png_base64
            .iter()
            .map(|encoded| {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(encoded)
                    .map_err(|e| OcrError::Protocol(format!("invalid base64 page payload: {e}")))?;
                image::load_from_memory(&bytes)
                    .map_err(|e| OcrError::Protocol(format!("could not decode rendered page: {e}")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_page_thumbnail_leaves_small_pages_untouched() {
        let page = DynamicImage::new_rgb8(64, 48);
        let thumb = render_page_thumbnail(&page, 512);
        assert_eq!((thumb.width(), thumb.height()), (64, 48));
    }

    #[test]
    fn render_page_thumbnail_bounds_large_pages() {
        let page = DynamicImage::new_rgb8(2000, 1000);
        let thumb = render_page_thumbnail(&page, 512);
        assert!(thumb.width() <= 512 && thumb.height() <= 512);
    }
}
