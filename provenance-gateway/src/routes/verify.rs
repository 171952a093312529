//! `POST /verify` and `GET /verify/{token}`: multi-signal verification of
//! an uploaded artifact, and a plain lookup-only endpoint by watermark
//! code or id.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use serde::Serialize;
use serde_json::{Value, json};

use provenance_core::document::{DocumentVerifyMethod, VerifyOutcome, verify};
use provenance_core::ids::lookup_by_token;
use provenance_core::types::record::ProvenanceRecord;

use crate::state::SharedState;

fn record_summary(record: &ProvenanceRecord) -> Value {
    json!({
        "watermark_id": record.watermark_id.to_hex(),
        "watermark_code": record.watermark_code.to_string(),
        "user_id": record.user_id,
        "original_filename": record.original_filename,
        "mime_type": record.mime_type,
        "metadata": record.metadata,
        "issued_at": record.issued_at,
    })
}

/// `POST /verify`
///
/// Accepts a single multipart `file` field and dispatches to the image or
/// document verification path based on its filename/content type.
pub async fn verify_route(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, (StatusCode, String)> {
    let mut filename = String::new();
    let mut mime_type = String::new();
    let mut bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().unwrap_or("upload").to_string();
            mime_type = field.content_type().unwrap_or("application/octet-stream").to_string();
            bytes = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid file field: {e}")))?
                    .to_vec(),
            );
        }
    }

    let bytes = bytes.ok_or((StatusCode::BAD_REQUEST, "missing file field".to_string()))?;

    let outcome = verify(
        &bytes,
        &filename,
        &mime_type,
        &state.config.watermark,
        &state.config.document_verifier,
        &state.config.ocr,
        state.repository.as_ref(),
        state.signer.as_ref(),
        state.rasterizer.as_ref(),
    );

    match outcome {
        VerifyOutcome::Image(outcome) => {
            if outcome.valid {
                state.metrics.provenance.verifications_accepted_total.inc();
            } else if outcome.fallback.is_some() {
                state.metrics.provenance.verifications_ambiguous_total.inc();
            } else {
                state.metrics.provenance.verifications_rejected_total.inc();
            }

            Ok(Json(json!({
                "kind": "image",
                "valid": outcome.valid,
                "confidence": outcome.confidence,
                "tamper_suspected": outcome.tamper_suspected,
                "watermark_id": outcome.watermark_id.map(|id| id.to_hex()),
                "watermark_code": outcome.watermark_code.map(|c| c.to_string()),
                "record": outcome.record.as_ref().map(record_summary),
                "reason": outcome.reason,
                "fallback": outcome.fallback.map(|f| json!({
                    "hamming_distance": f.hamming_distance,
                    "match_type": f.match_type,
                    "record": record_summary(&f.record),
                })),
            })))
        }
        VerifyOutcome::Document(outcome) => {
            if outcome.valid {
                state.metrics.provenance.verifications_accepted_total.inc();
            } else if outcome.method == Some(DocumentVerifyMethod::PerceptualPdfAmbiguous) {
                state.metrics.provenance.verifications_ambiguous_total.inc();
            } else {
                state.metrics.provenance.verifications_rejected_total.inc();
            }

            let method = outcome.method.map(|m| match m {
                DocumentVerifyMethod::Pades => "pades",
                DocumentVerifyMethod::PerceptualPdf => "perceptual_pdf",
                DocumentVerifyMethod::PerceptualPdfAmbiguous => "perceptual_pdf_ambiguous",
            });

            Ok(Json(json!({
                "kind": "document",
                "valid": outcome.valid,
                "method": method,
                "confidence": outcome.confidence,
                "ownership_confidence": outcome.ownership_confidence,
                "tamper_suspected": outcome.tamper_suspected,
                "signature_valid": outcome.signature_valid,
                "signer_cert_thumbprint": outcome.signer_cert_thumbprint.map(|t| t.to_hex()),
                "record": outcome.record.as_ref().map(record_summary),
                "candidates": outcome.candidates.iter().map(record_summary).collect::<Vec<_>>(),
                "reason": outcome.reason,
                "similarity": outcome.similarity.map(|s| json!({
                    "similarity_score": s.similarity_score,
                    "tamper_flag": s.tamper_flag,
                    "diff_summary": s.diff_summary,
                })),
            })))
        }
    }
}

#[derive(Debug, Serialize)]
struct LookupResponse {
    watermark_id: String,
    watermark_code: String,
    user_id: String,
    original_filename: String,
    metadata: Value,
}

/// `GET /verify/{token}`
///
/// Plain lookup by watermark code or raw hex id, with no evidence
/// re-derivation. Accepts the same tolerant token shapes as
/// `normalize_watermark_token` (a bare code, a bare id, or either with a
/// path/extension attached).
pub async fn lookup_route(
    State(state): State<SharedState>,
    Path(token): Path<String>,
) -> Result<Json<LookupResponse>, (StatusCode, String)> {
    let record = lookup_by_token(&token, state.repository.as_ref())
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::NOT_FOUND, "no matching provenance record".to_string()))?;

    Ok(Json(LookupResponse {
        watermark_id: record.watermark_id.to_hex(),
        watermark_code: record.watermark_code.to_string(),
        user_id: record.user_id,
        original_filename: record.original_filename,
        metadata: record.metadata,
    }))
}
