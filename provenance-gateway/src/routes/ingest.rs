//! `POST /ingest/image` and `POST /ingest/document`: mint a new identity
//! and persist its issuance record.

use axum::{Json, extract::Multipart, extract::State, http::StatusCode};
use serde::Serialize;
use serde_json::Value;

use provenance_core::ingest::{DocumentIngestRequest, ImageIngestRequest, ingest_document, ingest_image};

use crate::state::SharedState;

#[derive(Debug, Default)]
struct UploadedFile {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct ParsedUpload {
    user_id: String,
    metadata: Value,
    file: Option<UploadedFile>,
}

async fn parse_upload(mut multipart: Multipart) -> Result<ParsedUpload, (StatusCode, String)> {
    let mut parsed = ParsedUpload { metadata: Value::Object(Default::default()), ..Default::default() };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("malformed multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "user_id" => {
                parsed.user_id = field
                    .text()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid user_id field: {e}")))?;
            }
            "metadata" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid metadata field: {e}")))?;
                parsed.metadata = serde_json::from_str(&raw)
                    .map_err(|e| (StatusCode::BAD_REQUEST, format!("metadata must be JSON: {e}")))?;
            }
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or("application/octet-stream").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid file field: {e}")))?
                    .to_vec();
                parsed.file = Some(UploadedFile { filename, content_type, bytes });
            }
            _ => {}
        }
    }

    if parsed.user_id.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "missing user_id field".to_string()));
    }
    if parsed.file.is_none() {
        return Err((StatusCode::BAD_REQUEST, "missing file field".to_string()));
    }

    Ok(parsed)
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub message: &'static str,
    pub watermark_id: String,
    pub watermark_code: String,
    pub original_filename: String,
}

/// `POST /ingest/image`
///
/// Embeds a fresh watermark into the uploaded image and persists the
/// issuance record.
pub async fn ingest_image_route(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<IngestResponse>), (StatusCode, String)> {
    let upload = parse_upload(multipart).await?;
    let file = upload.file.expect("validated by parse_upload");

    let req = ImageIngestRequest {
        user_id: &upload.user_id,
        original_filename: &file.filename,
        mime_type: &file.content_type,
        bytes: &file.bytes,
        metadata: upload.metadata,
    };

    let outcome = ingest_image(req, &state.config.watermark, state.repository.as_ref())
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            message: "image successfully watermarked",
            watermark_id: outcome.watermark_id.to_hex(),
            watermark_code: outcome.record.watermark_code.to_string(),
            original_filename: outcome.record.original_filename,
        }),
    ))
}

/// `POST /ingest/document`
///
/// Records provenance for an already-signed document: verifies its
/// embedded signature for a thumbprint, fingerprints its rendered pages
/// and extracted text, and persists the issuance record.
pub async fn ingest_document_route(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<IngestResponse>), (StatusCode, String)> {
    let upload = parse_upload(multipart).await?;
    let file = upload.file.expect("validated by parse_upload");

    let req = DocumentIngestRequest {
        user_id: &upload.user_id,
        original_filename: &file.filename,
        bytes: &file.bytes,
        metadata: upload.metadata,
    };

    let outcome = ingest_document(
        req,
        state.signer.as_ref(),
        state.rasterizer.as_ref(),
        &state.config.ocr,
        state.repository.as_ref(),
    )
    .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            message: "document provenance recorded",
            watermark_id: outcome.watermark_id.to_hex(),
            watermark_code: outcome.record.watermark_code.to_string(),
            original_filename: outcome.record.original_filename,
        }),
    ))
}
