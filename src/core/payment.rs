//! Payment applier and reversal handler.
//!
//! A payment settles a selection of a family's unpaid fee records under one receipt id.
//! The whole batch runs in a single database transaction: every record is checked inside
//! the transaction, then one compare-and-swap `UPDATE` flips them to `Paid`. If the update
//! touches fewer rows than were selected the transaction is rolled back, so a batch is
//! never half applied.
//!
//! Reversal returns one record to `Unpaid` and clears its payment metadata. Other records
//! under the same receipt keep their payment; the receipt simply shows fewer lines.

use crate::{
    core::{
        fee::{self, ledger_order},
        ledger::sum_amounts,
    },
    entities::{Fee, FeeStatus, fee as fee_entity},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::BTreeSet;

/// Result of applying one payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentOutcome {
    /// Receipt id stamped on every settled record
    pub receipt_id: String,
    /// Family the payment was made for
    pub family_id: String,
    /// When the payment was recorded
    pub payment_date: DateTime<Utc>,
    /// How the payment was made
    pub payment_method: String,
    /// The records that were settled, in ledger order
    pub fees: Vec<fee_entity::Model>,
    /// Sum of the settled amounts
    pub amount_paid: f64,
}

/// Marks the selected unpaid records of a family as paid under a fresh receipt id.
///
/// # Arguments
/// * `family_id` - Family the payment is for; every selected record must belong to it
/// * `fee_ids` - Records to settle; duplicates are ignored
/// * `payment_method` - Free-text method label (e.g. "Cash")
///
/// # Errors
/// * [`Error::NothingSelected`] if `fee_ids` is empty
/// * [`Error::FeeNotFound`], [`Error::FamilyMismatch`], [`Error::FeeAlreadyPaid`] if a
///   selected record cannot be settled; nothing is written in that case
/// * [`Error::ConcurrentModification`] if another writer changed a record mid-batch
pub async fn apply_payment<C>(
    db: &C,
    family_id: &str,
    fee_ids: &[String],
    payment_method: &str,
) -> Result<PaymentOutcome>
where
    C: TransactionTrait,
{
    let selected: BTreeSet<&str> = fee_ids.iter().map(String::as_str).collect();
    if selected.is_empty() {
        return Err(Error::NothingSelected);
    }

    let payment_method = payment_method.trim();
    if payment_method.is_empty() {
        return Err(Error::Validation {
            message: "Payment method cannot be empty".to_string(),
        });
    }

    let receipt_id = fee::new_receipt_id();
    let now = Utc::now();

    let txn = db.begin().await?;

    let found = Fee::find()
        .filter(fee_entity::Column::Id.is_in(selected.iter().copied()))
        .all(&txn)
        .await?;

    for id in &selected {
        let record = found
            .iter()
            .find(|f| f.id == *id)
            .ok_or_else(|| Error::FeeNotFound {
                id: (*id).to_string(),
            })?;
        record.check_payment_fields()?;

        if record.family_id != family_id {
            return Err(Error::FamilyMismatch {
                id: record.id.clone(),
                expected: family_id.to_string(),
                actual: record.family_id.clone(),
            });
        }

        if !record.is_outstanding() {
            return Err(Error::FeeAlreadyPaid {
                id: record.id.clone(),
            });
        }
    }

    if let Err(e) =
        mark_paid(&txn, family_id, &selected, payment_method, &receipt_id, now).await
    {
        txn.rollback().await?;
        return Err(e);
    }

    let mut paid = Fee::find()
        .filter(fee_entity::Column::ReceiptId.eq(receipt_id.as_str()))
        .all(&txn)
        .await?;

    txn.commit().await?;

    paid.sort_by(ledger_order);
    let amount_paid = sum_amounts(&paid);

    tracing::info!(
        "Applied payment {} for family {}: {} record(s), {:.2} via {}",
        receipt_id,
        family_id,
        paid.len(),
        amount_paid,
        payment_method
    );

    Ok(PaymentOutcome {
        receipt_id,
        family_id: family_id.to_string(),
        payment_date: now,
        payment_method: payment_method.to_string(),
        fees: paid,
        amount_paid,
    })
}

/// Returns one paid record to unpaid and clears its payment metadata.
///
/// # Errors
/// * [`Error::FeeNotFound`] if the record does not exist
/// * [`Error::FeeNotPaid`] if the record is already unpaid
pub async fn reverse_payment<C>(db: &C, fee_id: &str) -> Result<fee_entity::Model>
where
    C: ConnectionTrait,
{
    let record = fee::get_fee_by_id(db, fee_id)
        .await?
        .ok_or_else(|| Error::FeeNotFound {
            id: fee_id.to_string(),
        })?;

    if !matches!(record.status, FeeStatus::Paid) {
        return Err(Error::FeeNotPaid {
            id: fee_id.to_string(),
        });
    }

    mark_unpaid(db, fee_id).await?;

    tracing::info!(
        "Reversed payment of fee {} ({:.2}) from receipt {}",
        fee_id,
        record.amount,
        record.receipt_id.as_deref().unwrap_or("-")
    );

    fee::get_fee_by_id(db, fee_id)
        .await?
        .ok_or_else(|| Error::FeeNotFound {
            id: fee_id.to_string(),
        })
}

/// Flips the selected records of a family from `Unpaid` to `Paid` in one guarded update.
///
/// Only rows that are still unpaid and owned by `family_id` match, so a record changed by
/// another writer since it was checked makes the row count fall short.
async fn mark_paid<C>(
    db: &C,
    family_id: &str,
    selected: &BTreeSet<&str>,
    payment_method: &str,
    receipt_id: &str,
    paid_at: DateTime<Utc>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let update = Fee::update_many()
        .set(fee_entity::ActiveModel {
            status: Set(FeeStatus::Paid),
            payment_date: Set(Some(paid_at)),
            payment_method: Set(Some(payment_method.to_string())),
            receipt_id: Set(Some(receipt_id.to_string())),
            ..Default::default()
        })
        .filter(fee_entity::Column::Id.is_in(selected.iter().copied()))
        .filter(fee_entity::Column::FamilyId.eq(family_id))
        .filter(fee_entity::Column::Status.eq(FeeStatus::Unpaid))
        .exec(db)
        .await?;

    let expected = selected.len() as u64;
    if update.rows_affected != expected {
        return Err(Error::ConcurrentModification {
            expected,
            updated: update.rows_affected,
        });
    }
    Ok(())
}

/// Returns one record from `Paid` to `Unpaid`, clearing its payment metadata.
///
/// Matches only while the record is still paid; otherwise nothing changes.
async fn mark_unpaid<C>(db: &C, fee_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let update = Fee::update_many()
        .set(fee_entity::ActiveModel {
            status: Set(FeeStatus::Unpaid),
            payment_date: Set(None),
            payment_method: Set(None),
            receipt_id: Set(None),
            ..Default::default()
        })
        .filter(fee_entity::Column::Id.eq(fee_id))
        .filter(fee_entity::Column::Status.eq(FeeStatus::Paid))
        .exec(db)
        .await?;

    if update.rows_affected == 0 {
        return Err(Error::FeeNotPaid {
            id: fee_id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::ledger;
    use crate::test_utils::*;
    use sea_orm::sea_query::Expr;

    #[tokio::test]
    async fn test_apply_payment_nothing_selected() -> Result<()> {
        let db = setup_test_db().await?;
        let result = apply_payment(&db, "F001", &[], "Cash").await;
        assert!(matches!(result.unwrap_err(), Error::NothingSelected));
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_payment_requires_method() -> Result<()> {
        let db = setup_test_db().await?;
        let result = apply_payment(&db, "F001", &["FEE-1".to_string()], "   ").await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_payment_shares_receipt_id() -> Result<()> {
        let (db, family) = setup_with_family().await?;
        let a = fee::create_fee(&db, &family.id, "January", 2025, 2000.0).await?;
        let b = fee::create_fee(&db, &family.id, "February", 2025, 1500.0).await?;
        let c = fee::create_fee(&db, &family.id, "March", 2025, 1000.0).await?;

        let before = ledger::get_outstanding(&db, &family.id).await?;
        let outcome =
            apply_payment(&db, &family.id, &[b.id.clone(), a.id.clone()], "Cash").await?;

        assert_eq!(outcome.fees.len(), 2);
        assert_eq!(outcome.amount_paid, 3500.0);
        for paid in &outcome.fees {
            assert_eq!(paid.status, FeeStatus::Paid);
            assert_eq!(paid.receipt_id.as_deref(), Some(outcome.receipt_id.as_str()));
            assert_eq!(paid.payment_method.as_deref(), Some("Cash"));
            assert!(paid.payment_date.is_some());
            assert!(paid.check_payment_fields().is_ok());
        }

        let after = ledger::get_outstanding(&db, &family.id).await?;
        assert_eq!(before.total - after.total, outcome.amount_paid);
        assert_eq!(after.fees.len(), 1);
        assert_eq!(after.fees[0].id, c.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_payment_collapses_duplicates() -> Result<()> {
        let (db, family) = setup_with_family().await?;
        let a = fee::create_fee(&db, &family.id, "January", 2025, 2000.0).await?;

        let outcome =
            apply_payment(&db, &family.id, &[a.id.clone(), a.id.clone()], "Cash").await?;
        assert_eq!(outcome.fees.len(), 1);
        assert_eq!(outcome.amount_paid, 2000.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_payment_is_all_or_nothing() -> Result<()> {
        let (db, family) = setup_with_family().await?;
        let a = fee::create_fee(&db, &family.id, "January", 2025, 2000.0).await?;
        let b = fee::create_fee(&db, &family.id, "February", 2025, 1500.0).await?;
        apply_payment(&db, &family.id, &[b.id.clone()], "Cash").await?;

        let result = apply_payment(&db, &family.id, &[a.id.clone(), b.id.clone()], "Cash").await;
        assert!(matches!(result.unwrap_err(), Error::FeeAlreadyPaid { id } if id == b.id));

        // The unpaid record in the rejected batch was not touched
        let a_after = fee::get_fee_by_id(&db, &a.id).await?.unwrap();
        assert_eq!(a_after.status, FeeStatus::Unpaid);
        assert!(a_after.receipt_id.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_payment_rejects_unknown_and_foreign_fees() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_family(&db, "F001").await?;
        create_test_family(&db, "F002").await?;
        let foreign = fee::create_fee(&db, "F002", "January", 2025, 800.0).await?;

        let result = apply_payment(&db, "F001", &["FEE-missing".to_string()], "Cash").await;
        assert!(matches!(result.unwrap_err(), Error::FeeNotFound { .. }));

        let result = apply_payment(&db, "F001", &[foreign.id.clone()], "Cash").await;
        assert!(matches!(
            result.unwrap_err(),
            Error::FamilyMismatch { expected, actual, .. } if expected == "F001" && actual == "F002"
        ));

        let untouched = fee::get_fee_by_id(&db, &foreign.id).await?.unwrap();
        assert_eq!(untouched.status, FeeStatus::Unpaid);
        Ok(())
    }

    #[tokio::test]
    async fn test_reverse_payment_restores_outstanding() -> Result<()> {
        let (db, family) = setup_with_family().await?;
        let a = fee::create_fee(&db, &family.id, "January", 2025, 2000.0).await?;
        let b = fee::create_fee(&db, &family.id, "February", 2025, 1500.0).await?;
        let outcome =
            apply_payment(&db, &family.id, &[a.id.clone(), b.id.clone()], "Cash").await?;

        let reversed = reverse_payment(&db, &a.id).await?;
        assert_eq!(reversed.status, FeeStatus::Unpaid);
        assert!(reversed.payment_date.is_none());
        assert!(reversed.payment_method.is_none());
        assert!(reversed.receipt_id.is_none());

        let outstanding = ledger::get_outstanding(&db, &family.id).await?;
        assert_eq!(outstanding.fees.len(), 1);
        assert_eq!(outstanding.fees[0].id, a.id);
        assert_eq!(outstanding.fees[0].amount, 2000.0);

        // The sibling under the same receipt keeps its payment
        let sibling = fee::get_fee_by_id(&db, &b.id).await?.unwrap();
        assert_eq!(sibling.status, FeeStatus::Paid);
        assert_eq!(sibling.receipt_id.as_deref(), Some(outcome.receipt_id.as_str()));
        Ok(())
    }

    #[tokio::test]
    async fn test_short_update_rolls_back_whole_batch() -> Result<()> {
        let (db, family) = setup_with_family().await?;
        let a = fee::create_fee(&db, &family.id, "January", 2025, 2000.0).await?;
        let b = fee::create_fee(&db, &family.id, "February", 2025, 1500.0).await?;
        // Another writer settles b after the batch was checked
        apply_payment(&db, &family.id, &[b.id.clone()], "Cash").await?;

        let selected: BTreeSet<&str> = [a.id.as_str(), b.id.as_str()].into_iter().collect();
        let txn = db.begin().await?;
        let result =
            mark_paid(&txn, &family.id, &selected, "Cash", "RCPT-race", Utc::now()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ConcurrentModification {
                expected: 2,
                updated: 1
            }
        ));
        txn.rollback().await?;

        let a_after = fee::get_fee_by_id(&db, &a.id).await?.unwrap();
        assert_eq!(a_after.status, FeeStatus::Unpaid);
        assert!(a_after.receipt_id.is_none());
        assert!(fee::get_fees_by_receipt(&db, "RCPT-race").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_guarded_reversal_leaves_unpaid_record_alone() -> Result<()> {
        let (db, family) = setup_with_family().await?;
        let a = fee::create_fee(&db, &family.id, "January", 2025, 2000.0).await?;
        let outcome = apply_payment(&db, &family.id, &[a.id.clone()], "Cash").await?;

        mark_unpaid(&db, &a.id).await?;
        // A second reversal racing the first finds nothing left to reverse
        let result = mark_unpaid(&db, &a.id).await;
        assert!(matches!(result.unwrap_err(), Error::FeeNotPaid { id } if id == a.id));

        let a_after = fee::get_fee_by_id(&db, &a.id).await?.unwrap();
        assert_eq!(a_after.status, FeeStatus::Unpaid);
        assert!(fee::get_fees_by_receipt(&db, &outcome.receipt_id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_inconsistent_record_blocks_payment() -> Result<()> {
        let (db, family) = setup_with_family().await?;
        let a = fee::create_fee(&db, &family.id, "January", 2025, 2000.0).await?;
        Fee::update_many()
            .col_expr(fee_entity::Column::ReceiptId, Expr::value("RCPT-stray"))
            .filter(fee_entity::Column::Id.eq(a.id.as_str()))
            .exec(&db)
            .await?;

        let result = apply_payment(&db, &family.id, &[a.id.clone()], "Cash").await;
        assert!(matches!(result.unwrap_err(), Error::InconsistentFee { id, .. } if id == a.id));

        let result = ledger::get_outstanding(&db, &family.id).await;
        assert!(matches!(result.unwrap_err(), Error::InconsistentFee { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_reverse_unpaid_fee_is_rejected() -> Result<()> {
        let (db, family) = setup_with_family().await?;
        let a = fee::create_fee(&db, &family.id, "January", 2025, 2000.0).await?;

        let result = reverse_payment(&db, &a.id).await;
        assert!(matches!(result.unwrap_err(), Error::FeeNotPaid { .. }));

        let result = reverse_payment(&db, "FEE-missing").await;
        assert!(matches!(result.unwrap_err(), Error::FeeNotFound { .. }));
        Ok(())
    }
}
