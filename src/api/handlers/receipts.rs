//! Receipt retrieval for office staff and for anyone holding a receipt link.

use crate::{
    api::{
        AppState,
        error::{ApiResult, not_found},
    },
    core::{
        receipt::{self, Receipt},
        report,
    },
    qr,
};
use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::info;

/// Receipt plus the link and scannable code printed on it.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptPayload {
    /// The reconstructed receipt
    #[serde(flatten)]
    pub receipt: Receipt,
    /// Public URL of this receipt
    pub receipt_url: String,
    /// QR code for `receipt_url` as a data URI, absent if encoding failed
    pub qr_code: Option<String>,
}

async fn receipt_payload(
    state: &AppState,
    db: &DatabaseConnection,
    receipt_id: &str,
) -> ApiResult<Option<ReceiptPayload>> {
    let Some(receipt) = receipt::reconstruct_receipt(db, receipt_id).await? else {
        return Ok(None);
    };

    let receipt_url = state.receipt_url(receipt_id);
    let qr_code = qr::encode_or_log(state.qr.as_ref(), &receipt_url);

    Ok(Some(ReceiptPayload {
        receipt,
        receipt_url,
        qr_code,
    }))
}

fn into_response(receipt_id: &str, payload: Option<ReceiptPayload>) -> Response {
    match payload {
        Some(payload) => Json(payload).into_response(),
        None => not_found(format!("Receipt '{receipt_id}' not found")),
    }
}

/// GET /api/receipts/:id
pub async fn get_receipt(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
) -> ApiResult<Response> {
    info!("GET /api/receipts/{receipt_id}");
    let payload = receipt_payload(&state, &state.db, &receipt_id).await?;
    Ok(into_response(&receipt_id, payload))
}

/// GET /public/receipts/:id - served from the read-only public handle
pub async fn get_public_receipt(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
) -> ApiResult<Response> {
    info!("GET /public/receipts/{receipt_id}");
    let payload = receipt_payload(&state, &state.public_db, &receipt_id).await?;
    Ok(into_response(&receipt_id, payload))
}

/// GET /api/receipts/:id/text - printable plain-text rendering
pub async fn get_receipt_text(
    State(state): State<AppState>,
    Path(receipt_id): Path<String>,
) -> ApiResult<Response> {
    info!("GET /api/receipts/{receipt_id}/text");

    let Some(found) = receipt::reconstruct_receipt(&state.db, &receipt_id).await? else {
        return Ok(not_found(format!("Receipt '{receipt_id}' not found")));
    };

    let text = report::format_receipt_text(&found, &state.school_name);
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        text,
    )
        .into_response())
}
