//! Income report and billing run handlers.

use crate::{
    api::{AppState, error::ApiResult},
    core::{
        billing::{self, BillingRunResult},
        report::{self, IncomeSummary},
    },
    errors::Error,
};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use tracing::info;

/// Query parameters of `GET /api/reports/income`
#[derive(Debug, Deserialize)]
pub struct IncomeQuery {
    /// First day of the period (defaults to the first of the current month)
    pub from: Option<NaiveDate>,
    /// Last day of the period, inclusive (defaults to today)
    pub to: Option<NaiveDate>,
}

/// GET /api/reports/income
pub async fn income(
    State(state): State<AppState>,
    Query(query): Query<IncomeQuery>,
) -> ApiResult<Json<IncomeSummary>> {
    info!("GET /api/reports/income - query: {:?}", query);

    let today = Utc::now().date_naive();
    let from = query.from.unwrap_or_else(|| today.with_day(1).unwrap_or(today));
    let to = query.to.unwrap_or(today);
    let end = to.succ_opt().ok_or_else(|| Error::Validation {
        message: format!("Report end date {to} is out of range"),
    })?;

    let summary = report::income_between(
        &state.db,
        from.and_time(NaiveTime::MIN).and_utc(),
        end.and_time(NaiveTime::MIN).and_utc(),
    )
    .await?;

    Ok(Json(summary))
}

/// POST /api/billing/run - bills the current month now
pub async fn run_billing(State(state): State<AppState>) -> ApiResult<Json<BillingRunResult>> {
    info!("POST /api/billing/run");
    let result = billing::run_monthly_billing(&state.db, Utc::now().date_naive()).await?;
    Ok(Json(result))
}
