//! Fee record business logic - Raising charges and reading them back.
//!
//! This module owns the fee id and receipt id formats, the month ordering used by the
//! ledger, and the read paths that every other module builds on. All reads validate the
//! status/payment-fields invariant before handing records out.

use crate::{
    core::family,
    entities::{Fee, FeeStatus, fee},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use std::cmp::Ordering;
use uuid::Uuid;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Generates a fresh fee record id.
#[must_use]
pub fn new_fee_id() -> String {
    format!("FEE-{}", Uuid::new_v4().simple())
}

/// Generates a fresh receipt id shared by every record settled in one payment.
///
/// The millisecond timestamp keeps receipt ids roughly sortable by time; the random
/// suffix keeps two payments in the same millisecond apart.
#[must_use]
pub fn new_receipt_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("RCPT-{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}

/// Returns the calendar month (1-12) for a label, accepting full names and
/// three-letter abbreviations in any case.
#[must_use]
pub fn month_index(label: &str) -> Option<u32> {
    let label = label.trim().to_lowercase();
    if label.len() < 3 {
        return None;
    }

    MONTHS
        .iter()
        .position(|m| *m == label || (label.len() == 3 && m.starts_with(&label)))
        .and_then(|i| u32::try_from(i + 1).ok())
}

/// Returns the full month name for a calendar month (1-12).
#[must_use]
pub fn month_name(month: u32) -> Option<&'static str> {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    NAMES.get(index).copied()
}

fn is_registration(label: &str) -> bool {
    label.trim().eq_ignore_ascii_case(family::REGISTRATION_LABEL)
}

/// Ledger order: registration charges first, then oldest year and month first.
///
/// Labels that are not months (e.g. "Annual Charges") come before the months of their year.
#[must_use]
pub fn ledger_order(a: &fee::Model, b: &fee::Model) -> Ordering {
    let key = |f: &fee::Model| {
        (
            !is_registration(&f.month),
            f.year,
            month_index(&f.month).unwrap_or(0),
        )
    };

    key(a)
        .cmp(&key(b))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Normalises a fee label: month names and abbreviations become the full month name,
/// any spelling of the registration label becomes [`family::REGISTRATION_LABEL`].
#[must_use]
pub fn canonical_label(label: &str) -> &str {
    let label = label.trim();
    if is_registration(label) {
        return family::REGISTRATION_LABEL;
    }
    month_index(label).and_then(month_name).unwrap_or(label)
}

/// Raises a new unpaid charge against a family.
///
/// # Arguments
/// * `family_id` - Family that owes the charge (must exist)
/// * `label` - Month name or a label such as `Registration`; stored in canonical form
/// * `year` - Year the charge belongs to
/// * `amount` - Positive, finite amount
pub async fn create_fee<C>(
    db: &C,
    family_id: &str,
    label: &str,
    year: i32,
    amount: f64,
) -> Result<fee::Model>
where
    C: ConnectionTrait,
{
    if amount <= 0.0 || !amount.is_finite() {
        return Err(Error::InvalidAmount { amount });
    }

    let label = canonical_label(label);
    if label.is_empty() {
        return Err(Error::Validation {
            message: "Fee label cannot be empty".to_string(),
        });
    }

    family::require_family(db, family_id).await?;

    let model = fee::ActiveModel {
        id: Set(new_fee_id()),
        family_id: Set(family_id.to_string()),
        month: Set(label.to_string()),
        year: Set(year),
        amount: Set(amount),
        status: Set(FeeStatus::Unpaid),
        payment_date: Set(None),
        payment_method: Set(None),
        receipt_id: Set(None),
        created_at: Set(Utc::now()),
    };

    let result = model.insert(db).await?;
    tracing::debug!(
        "Raised fee {} for family {}: {} {} = {:.2}",
        result.id,
        family_id,
        result.month,
        result.year,
        result.amount
    );
    Ok(result)
}

/// Finds a fee record by id, returning None if it does not exist.
pub async fn get_fee_by_id<C>(db: &C, fee_id: &str) -> Result<Option<fee::Model>>
where
    C: ConnectionTrait,
{
    let fee = Fee::find_by_id(fee_id.to_string()).one(db).await?;
    if let Some(fee) = &fee {
        fee.check_payment_fields()?;
    }
    Ok(fee)
}

/// Retrieves every fee record of a family, paid and unpaid, in ledger order.
pub async fn get_fees_for_family<C>(db: &C, family_id: &str) -> Result<Vec<fee::Model>>
where
    C: ConnectionTrait,
{
    let fees = Fee::find()
        .filter(fee::Column::FamilyId.eq(family_id))
        .all(db)
        .await?;
    validated_in_ledger_order(fees)
}

/// Retrieves the records settled under one receipt id, in ledger order.
pub async fn get_fees_by_receipt<C>(db: &C, receipt_id: &str) -> Result<Vec<fee::Model>>
where
    C: ConnectionTrait,
{
    let fees = Fee::find()
        .filter(fee::Column::ReceiptId.eq(receipt_id))
        .all(db)
        .await?;
    validated_in_ledger_order(fees)
}

/// Retrieves the records of a family with the given status, in ledger order.
pub async fn get_fees_by_status<C>(
    db: &C,
    family_id: &str,
    status: FeeStatus,
) -> Result<Vec<fee::Model>>
where
    C: ConnectionTrait,
{
    let fees = Fee::find()
        .filter(fee::Column::FamilyId.eq(family_id))
        .filter(fee::Column::Status.eq(status))
        .all(db)
        .await?;
    validated_in_ledger_order(fees)
}

fn validated_in_ledger_order(mut fees: Vec<fee::Model>) -> Result<Vec<fee::Model>> {
    for fee in &fees {
        fee.check_payment_fields()?;
    }
    fees.sort_by(ledger_order);
    Ok(fees)
}
