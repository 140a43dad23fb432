//! Fee entity - One billable charge owed by a family.
//!
//! A fee record is either `Unpaid` with no payment metadata, or `Paid` with
//! `payment_date`, `payment_method` and `receipt_id` all set by the same payment.
//! Records sharing a `receipt_id` were settled together and make up one receipt.

use crate::errors;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment status of a fee record, stored as text.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum FeeStatus {
    /// Outstanding; counts towards the family's dues
    #[sea_orm(string_value = "Unpaid")]
    Unpaid,
    /// Settled by a payment
    #[sea_orm(string_value = "Paid")]
    Paid,
}

/// Fee database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fees")]
pub struct Model {
    /// Generated identifier (`FEE-...`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Family that owes this charge
    pub family_id: String,
    /// Month name for tuition, or a label such as `Registration` / `Annual Charges`
    pub month: String,
    /// Academic year the charge belongs to
    pub year: i32,
    /// Amount owed, always positive
    pub amount: f64,
    /// `Unpaid` or `Paid`
    pub status: FeeStatus,
    /// When the payment was recorded
    pub payment_date: Option<DateTimeUtc>,
    /// How the payment was made (e.g. "Cash", "Bank Transfer")
    pub payment_method: Option<String>,
    /// Groups the records paid in one transaction
    pub receipt_id: Option<String>,
    /// When the charge was raised
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Fee and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each fee record belongs to one family
    #[sea_orm(
        belongs_to = "super::family::Entity",
        from = "Column::FamilyId",
        to = "super::family::Column::Id"
    )]
    Family,
}

impl Related<super::family::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Family.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Returns true when the record still counts towards the family's dues.
    #[must_use]
    pub fn is_outstanding(&self) -> bool {
        self.status == FeeStatus::Unpaid
    }

    /// Checks that status and payment metadata agree.
    ///
    /// Paid records must carry all three payment fields; unpaid records must carry none.
    pub fn check_payment_fields(&self) -> errors::Result<()> {
        let set = [
            self.payment_date.is_some(),
            self.payment_method.is_some(),
            self.receipt_id.is_some(),
        ];

        let reason = match self.status {
            FeeStatus::Paid if !set.iter().all(|s| *s) => "paid without complete payment details",
            FeeStatus::Unpaid if set.iter().any(|s| *s) => "unpaid but carries payment details",
            _ => return Ok(()),
        };

        Err(errors::Error::InconsistentFee {
            id: self.id.clone(),
            reason: reason.to_string(),
        })
    }
}
