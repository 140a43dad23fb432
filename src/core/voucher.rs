//! Fee vouchers - Printable payment demands for outstanding charges.
//!
//! A voucher lists either all of a family's outstanding records or a chosen subset, with
//! the amount due. Vouchers are computed on demand and never stored.

use crate::{
    core::{family, ledger},
    entities::fee as fee_entity,
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::ConnectionTrait;
use serde::Serialize;

/// One line on a voucher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoucherLine {
    /// Fee record id
    pub fee_id: String,
    /// Printable label, e.g. "January 2025"
    pub description: String,
    /// Amount due for this line
    pub amount: f64,
}

impl From<&fee_entity::Model> for VoucherLine {
    fn from(fee: &fee_entity::Model) -> Self {
        Self {
            fee_id: fee.id.clone(),
            description: format!("{} {}", fee.month, fee.year),
            amount: fee.amount,
        }
    }
}

/// A payment demand for a family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Voucher {
    /// Family being billed
    pub family_id: String,
    /// Family name
    pub family_name: String,
    /// Guardian the voucher is addressed to
    pub guardian_name: String,
    /// Charges demanded, in ledger order
    pub lines: Vec<VoucherLine>,
    /// Sum of the lines
    pub amount_due: f64,
    /// Family dues not covered by this voucher
    pub other_dues: f64,
    /// When the voucher was generated
    pub issued_at: DateTime<Utc>,
}

/// Builds a voucher for a family.
///
/// # Arguments
/// * `family_id` - Family to bill
/// * `fee_ids` - `None` to demand every outstanding record, or a subset of them
///
/// # Errors
/// * [`Error::FamilyNotFound`] if the family does not exist
/// * [`Error::NothingSelected`] if an explicit selection is empty
/// * [`Error::FeeNotFound`] if a selected id is not an outstanding record of the family
pub async fn build_voucher<C>(
    db: &C,
    family_id: &str,
    fee_ids: Option<&[String]>,
) -> Result<Voucher>
where
    C: ConnectionTrait,
{
    let family = family::require_family(db, family_id).await?;
    let outstanding = ledger::get_outstanding(db, family_id).await?;

    let selected: Vec<&fee_entity::Model> = match fee_ids {
        None => outstanding.fees.iter().collect(),
        Some([]) => return Err(Error::NothingSelected),
        Some(ids) => {
            if let Some(missing) = ids
                .iter()
                .find(|id| !outstanding.fees.iter().any(|f| &f.id == *id))
            {
                return Err(Error::FeeNotFound {
                    id: missing.clone(),
                });
            }
            outstanding
                .fees
                .iter()
                .filter(|f| ids.contains(&f.id))
                .collect()
        }
    };

    let lines: Vec<VoucherLine> = selected.into_iter().map(VoucherLine::from).collect();
    let amount_due: f64 = lines.iter().map(|l| l.amount).sum();

    Ok(Voucher {
        family_id: family.id,
        family_name: family.name,
        guardian_name: family.guardian_name,
        lines,
        amount_due,
        other_dues: outstanding.total - amount_due,
        issued_at: Utc::now(),
    })
}
