//! Family entity - The billing unit that owns students and fee records.
//!
//! Family ids are chosen by the caller (e.g. `F001`) rather than generated by the database,
//! matching how the school office numbers families on admission forms.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Family database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "families")]
pub struct Model {
    /// Caller-generated identifier (e.g. `F001`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Family or billing name shown on vouchers and receipts
    pub name: String,
    /// Name of the guardian responsible for payment
    pub guardian_name: String,
    /// Optional contact number
    pub phone: Option<String>,
    /// Tuition billed to this family every month
    pub monthly_fee: f64,
    /// Soft delete flag - deleted families are not billed or listed
    pub is_deleted: bool,
    /// When the family was admitted
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Family and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One family has many students
    #[sea_orm(has_many = "super::student::Entity")]
    Students,
    /// One family has many fee records
    #[sea_orm(has_many = "super::fee::Entity")]
    Fees,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl Related<super::fee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fees.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
