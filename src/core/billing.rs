//! Monthly billing run
//!
//! Raises one tuition charge per active family for a calendar month. A family is billed
//! at most once per month: if it already has a record for that calendar month and year,
//! under any spelling of the month, it is skipped. The date of the last run is kept in the
//! `system_state` table so the automatic run at start-up happens once per month.

use crate::{
    core::fee,
    entities::{Fee, SystemState, family, fee as fee_entity, system_state},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};

const LAST_MONTHLY_BILLING_KEY: &str = "last_monthly_billing";

/// Outcome of billing a single family.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FamilyBillingResult {
    /// Family that was billed
    pub family_id: String,
    /// Fee record that was raised
    pub fee_id: String,
    /// Amount billed
    pub amount: f64,
}

/// Outcome of a whole billing run.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BillingRunResult {
    /// Month label the charges were raised under (e.g. "March")
    pub month: String,
    /// Year of the billed month
    pub year: i32,
    /// Families billed in this run
    pub billed: Vec<FamilyBillingResult>,
    /// Families skipped because they were already billed for the month
    pub already_billed: usize,
    /// Families skipped because they have no monthly fee
    pub no_fee: usize,
    /// Date the run was performed for
    pub billing_date: NaiveDate,
}

impl BillingRunResult {
    /// Total amount raised by this run.
    #[must_use]
    pub fn total_billed(&self) -> f64 {
        self.billed.iter().map(|b| b.amount).sum()
    }
}

/// Returns true if no billing run has happened yet in the month of `today`.
pub async fn is_billing_needed<C>(db: &C, today: NaiveDate) -> Result<bool>
where
    C: ConnectionTrait,
{
    let last_run = get_last_billing_date(db).await?;

    Ok(last_run.is_none_or(|last| last.year() != today.year() || last.month() != today.month()))
}

/// Retrieves the date of the last billing run from the `system_state` table.
pub async fn get_last_billing_date<C>(db: &C) -> Result<Option<NaiveDate>>
where
    C: ConnectionTrait,
{
    let state = SystemState::find()
        .filter(system_state::Column::Key.eq(LAST_MONTHLY_BILLING_KEY))
        .one(db)
        .await?;

    match state {
        Some(s) => NaiveDate::parse_from_str(&s.value, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| Error::Config {
                message: format!("Failed to parse last billing date: {e}"),
            }),
        None => Ok(None),
    }
}

async fn set_last_billing_date<C>(db: &C, date: NaiveDate) -> Result<()>
where
    C: ConnectionTrait,
{
    let date_str = date.format("%Y-%m-%d").to_string();
    let now = Utc::now().naive_utc();

    let existing = SystemState::find()
        .filter(system_state::Column::Key.eq(LAST_MONTHLY_BILLING_KEY))
        .one(db)
        .await?;

    if let Some(state) = existing {
        let mut active_model: system_state::ActiveModel = state.into();
        active_model.value = Set(date_str);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_state = system_state::ActiveModel {
            key: Set(LAST_MONTHLY_BILLING_KEY.to_string()),
            value: Set(date_str),
            updated_at: Set(now),
            ..Default::default()
        };
        new_state.insert(db).await?;
    }

    Ok(())
}

/// Bills every active family for the month containing `billing_date`.
///
/// The run is a single database transaction: either every family is billed and the run
/// date recorded, or nothing changes.
pub async fn run_monthly_billing<C>(db: &C, billing_date: NaiveDate) -> Result<BillingRunResult>
where
    C: TransactionTrait,
{
    let month = fee::month_name(billing_date.month())
        .ok_or_else(|| Error::Config {
            message: format!("Invalid billing month in {billing_date}"),
        })?
        .to_string();
    let year = billing_date.year();

    let txn = db.begin().await?;

    let families = family::Entity::find()
        .filter(family::Column::IsDeleted.eq(false))
        .all(&txn)
        .await?;

    let mut billed = Vec::new();
    let mut already_billed = 0;
    let mut no_fee = 0;

    for fam in families {
        if fam.monthly_fee <= 0.0 {
            no_fee += 1;
            continue;
        }

        let billed_already = Fee::find()
            .filter(fee_entity::Column::FamilyId.eq(fam.id.as_str()))
            .filter(fee_entity::Column::Year.eq(year))
            .all(&txn)
            .await?
            .iter()
            .any(|f| fee::month_index(&f.month) == Some(billing_date.month()));
        if billed_already {
            already_billed += 1;
            continue;
        }

        let raised = fee::create_fee(&txn, &fam.id, &month, year, fam.monthly_fee).await?;
        billed.push(FamilyBillingResult {
            family_id: fam.id,
            fee_id: raised.id,
            amount: raised.amount,
        });
    }

    set_last_billing_date(&txn, billing_date).await?;
    txn.commit().await?;

    let result = BillingRunResult {
        month,
        year,
        billed,
        already_billed,
        no_fee,
        billing_date,
    };
    tracing::info!("{}", format_billing_summary(&result).trim_end());
    Ok(result)
}

/// Runs billing for the current month unless it already ran this month.
///
/// # Returns
/// * `Ok(Some(result))` - A run was performed
/// * `Ok(None)` - Billing already ran this month
pub async fn run_monthly_billing_if_needed(
    db: &DatabaseConnection,
) -> Result<Option<BillingRunResult>> {
    let today = Utc::now().date_naive();
    if !is_billing_needed(db, today).await? {
        tracing::debug!("Monthly billing already ran this month");
        return Ok(None);
    }

    run_monthly_billing(db, today).await.map(Some)
}

/// Formats a billing run into a human-readable summary.
#[must_use]
pub fn format_billing_summary(result: &BillingRunResult) -> String {
    use std::fmt::Write;

    let mut summary = format!(
        "Monthly billing - {} {} - {} families billed, {:.2} raised\n",
        result.month,
        result.year,
        result.billed.len(),
        result.total_billed()
    );

    // Writing to a String cannot fail
    let _ = writeln!(
        summary,
        "  Already billed: {} | No monthly fee: {}",
        result.already_billed, result.no_fee
    );

    for line in &result.billed {
        let _ = writeln!(
            summary,
            "  {} - {:.2} ({})",
            line.family_id, line.amount, line.fee_id
        );
    }

    summary
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::family::{NewFamily, create_family};
    use crate::test_utils::*;
    use sea_orm::PaginatorTrait;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_billing_needed_without_previous_run() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(is_billing_needed(&db, date(2025, 3, 1)).await?);
        assert!(get_last_billing_date(&db).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_billing_run_raises_one_charge_per_family() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_family(&db, "F001").await?;
        create_test_family(&db, "F002").await?;
        create_family(
            &db,
            NewFamily {
                monthly_fee: 0.0,
                ..new_test_family("F003")
            },
        )
        .await?;

        let result = run_monthly_billing(&db, date(2025, 3, 5)).await?;
        assert_eq!(result.month, "March");
        assert_eq!(result.year, 2025);
        assert_eq!(result.billed.len(), 2);
        assert_eq!(result.no_fee, 1);
        assert_eq!(result.total_billed(), 4000.0);

        let fees = fee::get_fees_for_family(&db, "F001").await?;
        assert_eq!(fees.len(), 1);
        assert_eq!(fees[0].month, "March");
        assert!(fees[0].is_outstanding());

        assert_eq!(get_last_billing_date(&db).await?, Some(date(2025, 3, 5)));
        assert!(!is_billing_needed(&db, date(2025, 3, 28)).await?);
        assert!(is_billing_needed(&db, date(2025, 4, 1)).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_billing_run_is_idempotent_per_month() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_family(&db, "F001").await?;

        run_monthly_billing(&db, date(2025, 3, 1)).await?;
        let second = run_monthly_billing(&db, date(2025, 3, 15)).await?;
        assert!(second.billed.is_empty());
        assert_eq!(second.already_billed, 1);

        let fees = fee::get_fees_for_family(&db, "F001").await?;
        assert_eq!(fees.len(), 1);

        let count = SystemState::find()
            .filter(system_state::Column::Key.eq(LAST_MONTHLY_BILLING_KEY))
            .count(&db)
            .await?;
        assert_eq!(count, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_billing_skips_months_raised_by_hand() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_family(&db, "F001").await?;
        fee::create_fee(&db, "F001", "march", 2025, 2000.0).await?;
        fee::create_fee(&db, "F001", "Apr", 2025, 2000.0).await?;

        let march = run_monthly_billing(&db, date(2025, 3, 5)).await?;
        assert!(march.billed.is_empty());
        assert_eq!(march.already_billed, 1);

        let april = run_monthly_billing(&db, date(2025, 4, 5)).await?;
        assert!(april.billed.is_empty());

        let months: Vec<String> = fee::get_fees_for_family(&db, "F001")
            .await?
            .into_iter()
            .map(|f| f.month)
            .collect();
        assert_eq!(months, vec!["March", "April"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_billing_skips_deleted_families() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_family(&db, "F001").await?;
        crate::core::family::delete_family(&db, "F001").await?;

        let result = run_monthly_billing(&db, date(2025, 3, 1)).await?;
        assert!(result.billed.is_empty());
        Ok(())
    }

    #[test]
    fn test_format_billing_summary() {
        let result = BillingRunResult {
            month: "March".to_string(),
            year: 2025,
            billed: vec![FamilyBillingResult {
                family_id: "F001".to_string(),
                fee_id: "FEE-1".to_string(),
                amount: 2000.0,
            }],
            already_billed: 2,
            no_fee: 1,
            billing_date: date(2025, 3, 1),
        };

        let summary = format_billing_summary(&result);
        assert!(summary.contains("March 2025"));
        assert!(summary.contains("1 families billed, 2000.00 raised"));
        assert!(summary.contains("Already billed: 2 | No monthly fee: 1"));
        assert!(summary.contains("F001 - 2000.00 (FEE-1)"));
    }
}
