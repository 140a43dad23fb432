//! Ledger reader - Derives a family's outstanding charges.
//!
//! The pure [`outstanding_for_family`] works over any slice of fee records; the async
//! [`get_outstanding`] fetches the family's unpaid records and applies the same rules.
//! Neither has side effects.

use crate::{
    core::fee::{self, ledger_order},
    entities::{FeeStatus, fee as fee_entity},
    errors::Result,
};
use sea_orm::ConnectionTrait;
use serde::Serialize;

/// Outstanding charges of one family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outstanding {
    /// Family the charges belong to
    pub family_id: String,
    /// Unpaid records, registration first, then oldest first
    pub fees: Vec<fee_entity::Model>,
    /// Sum of the unpaid amounts
    pub total: f64,
}

impl Outstanding {
    fn from_fees(family_id: &str, mut fees: Vec<fee_entity::Model>) -> Self {
        fees.sort_by(ledger_order);
        let total = sum_amounts(&fees);
        Self {
            family_id: family_id.to_string(),
            fees,
            total,
        }
    }
}

/// Sums the `amount` of each record.
#[must_use]
pub fn sum_amounts(fees: &[fee_entity::Model]) -> f64 {
    fees.iter().map(|f| f.amount).sum()
}

/// Picks a family's unpaid records out of the full fee collection.
///
/// A family without records yields an empty list and a total of zero.
#[must_use]
pub fn outstanding_for_family(family_id: &str, fees: &[fee_entity::Model]) -> Outstanding {
    let unpaid = fees
        .iter()
        .filter(|f| f.family_id == family_id && f.is_outstanding())
        .cloned()
        .collect();
    Outstanding::from_fees(family_id, unpaid)
}

/// Loads a family's outstanding charges from the database.
pub async fn get_outstanding<C>(db: &C, family_id: &str) -> Result<Outstanding>
where
    C: ConnectionTrait,
{
    let unpaid = fee::get_fees_by_status(db, family_id, FeeStatus::Unpaid).await?;
    Ok(Outstanding::from_fees(family_id, unpaid))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_family_without_fees_owes_nothing() {
        let fees = vec![fee_model("a", "January", 2025, 100.0)];
        let outstanding = outstanding_for_family("F999", &fees);
        assert!(outstanding.fees.is_empty());
        assert_eq!(outstanding.total, 0.0);

        let outstanding = outstanding_for_family("F001", &[]);
        assert!(outstanding.fees.is_empty());
        assert_eq!(outstanding.total, 0.0);
    }

    #[test]
    fn test_outstanding_skips_paid_and_foreign_records() {
        let mut other_family = fee_model("b", "January", 2025, 700.0);
        other_family.family_id = "F002".to_string();

        let fees = vec![
            fee_model("a", "February", 2025, 1500.0),
            other_family,
            paid_fee_model("c", "January", 2025, 2000.0, "RCPT-1"),
            fee_model("d", "Registration", 2025, 5000.0),
        ];

        let outstanding = outstanding_for_family("F001", &fees);
        let ids: Vec<&str> = outstanding.fees.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "a"]);
        assert_eq!(outstanding.total, 6500.0);
    }

    #[tokio::test]
    async fn test_get_outstanding_empty_family() -> Result<()> {
        let (db, family) = setup_with_family().await?;
        let outstanding = get_outstanding(&db, &family.id).await?;
        assert!(outstanding.fees.is_empty());
        assert_eq!(outstanding.total, 0.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_outstanding_matches_pure_reader() -> Result<()> {
        let (db, family) = setup_with_family().await?;
        fee::create_fee(&db, &family.id, "March", 2025, 1000.0).await?;
        fee::create_fee(&db, &family.id, "January", 2025, 2000.0).await?;
        fee::create_fee(&db, &family.id, "Registration", 2025, 500.0).await?;

        let from_db = get_outstanding(&db, &family.id).await?;
        let all = fee::get_fees_for_family(&db, &family.id).await?;
        let pure = outstanding_for_family(&family.id, &all);

        assert_eq!(from_db, pure);
        assert_eq!(from_db.total, 3500.0);
        assert_eq!(from_db.fees[0].month, "Registration");
        assert_eq!(from_db.fees[2].month, "March");
        Ok(())
    }
}
