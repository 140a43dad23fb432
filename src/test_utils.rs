//! Shared test utilities for the fee ledger.
//!
//! This module provides helpers for setting up in-memory test databases and building
//! families and fee records with sensible defaults.

use crate::{
    core::family::{self, NewFamily},
    entities::{self, FeeStatus},
    errors::Result,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Admission details with sensible defaults.
///
/// # Defaults
/// * `name`: `"Test Family"`
/// * `guardian_name`: `"Test Guardian"`
/// * `monthly_fee`: 2000.0
pub fn new_test_family(id: &str) -> NewFamily {
    NewFamily {
        id: id.to_string(),
        name: "Test Family".to_string(),
        guardian_name: "Test Guardian".to_string(),
        phone: None,
        monthly_fee: 2000.0,
    }
}

/// Creates a test family with default details.
pub async fn create_test_family(
    db: &DatabaseConnection,
    id: &str,
) -> Result<entities::family::Model> {
    family::create_family(db, new_test_family(id)).await
}

/// Sets up a complete test environment with one family (`F001`).
/// Returns (db, family) for common test scenarios.
pub async fn setup_with_family() -> Result<(DatabaseConnection, entities::family::Model)> {
    let db = setup_test_db().await?;
    let family = create_test_family(&db, "F001").await?;
    Ok((db, family))
}

/// Builds an in-memory family model without touching a database.
pub fn family_model(id: &str) -> entities::family::Model {
    entities::family::Model {
        id: id.to_string(),
        name: "Test Family".to_string(),
        guardian_name: "Test Guardian".to_string(),
        phone: None,
        monthly_fee: 2000.0,
        is_deleted: false,
        created_at: Utc::now(),
    }
}

/// Builds an unpaid fee model for family `F001` without touching a database.
pub fn fee_model(id: &str, month: &str, year: i32, amount: f64) -> entities::fee::Model {
    entities::fee::Model {
        id: id.to_string(),
        family_id: "F001".to_string(),
        month: month.to_string(),
        year,
        amount,
        status: FeeStatus::Unpaid,
        payment_date: None,
        payment_method: None,
        receipt_id: None,
        created_at: Utc::now(),
    }
}

/// Builds a fee model for family `F001` paid in cash under `receipt_id`.
pub fn paid_fee_model(
    id: &str,
    month: &str,
    year: i32,
    amount: f64,
    receipt_id: &str,
) -> entities::fee::Model {
    entities::fee::Model {
        status: FeeStatus::Paid,
        payment_date: Some(Utc::now()),
        payment_method: Some("Cash".to_string()),
        receipt_id: Some(receipt_id.to_string()),
        ..fee_model(id, month, year, amount)
    }
}
