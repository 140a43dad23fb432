//! Receipt reconstruction - Rebuilds a point-in-time view of one payment.
//!
//! Receipts are not stored. Given a receipt id, the settled records are the ones stamped
//! with it, the remaining dues are the family's records that are still unpaid, and the
//! dues before the payment are the two added together.

use crate::{
    core::{fee, ledger, student},
    entities::{Family, family as family_entity, fee as fee_entity, student as student_entity},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, EntityTrait};
use serde::Serialize;

/// A reconstructed payment receipt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    /// Receipt id shared by the settled records
    pub receipt_id: String,
    /// Family that paid
    pub family: family_entity::Model,
    /// Students billed under the family
    pub students: Vec<student_entity::Model>,
    /// Records settled by this payment, in ledger order
    pub paid_fees: Vec<fee_entity::Model>,
    /// When the payment was recorded
    pub payment_date: Option<DateTime<Utc>>,
    /// How the payment was made
    pub payment_method: Option<String>,
    /// Sum of the settled records
    pub amount_paid: f64,
    /// Family dues that are still unpaid
    pub remaining_dues: f64,
    /// Family dues immediately before this payment
    pub total_dues_before: f64,
}

/// Builds a receipt from a family's fee records.
///
/// Returns `None` when no record in `family_fees` carries `receipt_id`.
#[must_use]
pub fn build_receipt(
    receipt_id: &str,
    family: family_entity::Model,
    students: Vec<student_entity::Model>,
    family_fees: &[fee_entity::Model],
) -> Option<Receipt> {
    let mut paid_fees: Vec<fee_entity::Model> = family_fees
        .iter()
        .filter(|f| f.receipt_id.as_deref() == Some(receipt_id))
        .cloned()
        .collect();

    if paid_fees.is_empty() {
        return None;
    }
    paid_fees.sort_by(fee::ledger_order);

    let amount_paid = ledger::sum_amounts(&paid_fees);
    let remaining_dues = ledger::outstanding_for_family(&family.id, family_fees).total;
    let first = &paid_fees[0];
    let payment_date = first.payment_date;
    let payment_method = first.payment_method.clone();

    Some(Receipt {
        receipt_id: receipt_id.to_string(),
        family,
        students,
        paid_fees,
        payment_date,
        payment_method,
        amount_paid,
        remaining_dues,
        total_dues_before: remaining_dues + amount_paid,
    })
}

/// Reconstructs a receipt from the database.
///
/// Returns `Ok(None)` when no record carries the receipt id, or when the paying family
/// cannot be found. Soft-deleted families still get their receipts. Performs no writes.
pub async fn reconstruct_receipt<C>(db: &C, receipt_id: &str) -> Result<Option<Receipt>>
where
    C: ConnectionTrait,
{
    let stamped = fee::get_fees_by_receipt(db, receipt_id).await?;
    let Some(first) = stamped.first() else {
        tracing::warn!("Receipt {receipt_id} not found");
        return Ok(None);
    };

    let family_id = first.family_id.clone();
    let Some(family) = Family::find_by_id(family_id.clone()).one(db).await? else {
        tracing::warn!("Receipt {receipt_id} refers to missing family {family_id}");
        return Ok(None);
    };

    let students = student::get_students_for_family(db, &family_id).await?;
    let family_fees = fee::get_fees_for_family(db, &family_id).await?;

    Ok(build_receipt(receipt_id, family, students, &family_fees))
}
