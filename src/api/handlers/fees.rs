//! Fee, dues, voucher and payment handlers.

use crate::{
    api::{AppState, error::ApiResult},
    core::{
        fee, ledger,
        payment::{self, PaymentOutcome},
        voucher::{self, Voucher},
    },
    entities::fee as fee_entity,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::info;

/// Body of `POST /api/families/:id/fees`
#[derive(Debug, Deserialize)]
pub struct CreateFeeRequest {
    /// Month name or a label such as "Annual Charges"
    pub month: String,
    /// Year of the charge
    pub year: i32,
    /// Amount owed
    pub amount: f64,
}

/// Body of `POST /api/families/:id/voucher`
#[derive(Debug, Default, Deserialize)]
pub struct VoucherRequest {
    /// Records to demand; all outstanding records when absent
    #[serde(default)]
    pub fee_ids: Option<Vec<String>>,
}

/// Body of `POST /api/families/:id/payments`
#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    /// Records to settle
    #[serde(default)]
    pub fee_ids: Vec<String>,
    /// How the payment was made
    pub payment_method: String,
}

/// GET /api/families/:id/fees
pub async fn list_fees(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
) -> ApiResult<Json<Vec<fee_entity::Model>>> {
    info!("GET /api/families/{family_id}/fees");
    Ok(Json(fee::get_fees_for_family(&state.db, &family_id).await?))
}

/// POST /api/families/:id/fees
pub async fn create_fee(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
    Json(request): Json<CreateFeeRequest>,
) -> ApiResult<(StatusCode, Json<fee_entity::Model>)> {
    info!(
        "POST /api/families/{family_id}/fees - {} {}",
        request.month, request.year
    );

    let created = fee::create_fee(
        &state.db,
        &family_id,
        &request.month,
        request.year,
        request.amount,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/families/:id/outstanding
pub async fn get_outstanding(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
) -> ApiResult<Json<ledger::Outstanding>> {
    info!("GET /api/families/{family_id}/outstanding");
    Ok(Json(ledger::get_outstanding(&state.db, &family_id).await?))
}

/// POST /api/families/:id/voucher
pub async fn create_voucher(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
    Json(request): Json<VoucherRequest>,
) -> ApiResult<Json<Voucher>> {
    info!("POST /api/families/{family_id}/voucher");
    let built = voucher::build_voucher(&state.db, &family_id, request.fee_ids.as_deref()).await?;
    Ok(Json(built))
}

/// POST /api/families/:id/payments
pub async fn apply_payment(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
    Json(request): Json<PaymentRequest>,
) -> ApiResult<(StatusCode, Json<PaymentOutcome>)> {
    info!(
        "POST /api/families/{family_id}/payments - {} record(s)",
        request.fee_ids.len()
    );

    let outcome = payment::apply_payment(
        &state.db,
        &family_id,
        &request.fee_ids,
        &request.payment_method,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// POST /api/fees/:id/reversal
pub async fn reverse_payment(
    State(state): State<AppState>,
    Path(fee_id): Path<String>,
) -> ApiResult<Json<fee_entity::Model>> {
    info!("POST /api/fees/{fee_id}/reversal");
    Ok(Json(payment::reverse_payment(&state.db, &fee_id).await?))
}
