//! Family business logic - Admission, lookup and seeding of billing families.

use crate::{
    config::school::SchoolConfig,
    core::{fee, student},
    entities::{Family, family},
    errors::{Error, Result},
};
use chrono::{Datelike, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};

/// Registration charges are labelled this way so the ledger can put them first.
pub const REGISTRATION_LABEL: &str = "Registration";

/// Details needed to admit a family.
#[derive(Debug, Clone)]
pub struct NewFamily {
    /// Caller-generated id (e.g. `F001`)
    pub id: String,
    /// Family name
    pub name: String,
    /// Guardian responsible for fees
    pub guardian_name: String,
    /// Contact number
    pub phone: Option<String>,
    /// Monthly tuition
    pub monthly_fee: f64,
}

/// Creates a family after validating its id, name and monthly fee.
pub async fn create_family<C>(db: &C, new_family: NewFamily) -> Result<family::Model>
where
    C: ConnectionTrait,
{
    let id = new_family.id.trim().to_string();
    if id.is_empty() {
        return Err(Error::Validation {
            message: "Family id cannot be empty".to_string(),
        });
    }

    if new_family.name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Family name cannot be empty".to_string(),
        });
    }

    if new_family.monthly_fee < 0.0 || !new_family.monthly_fee.is_finite() {
        return Err(Error::InvalidAmount {
            amount: new_family.monthly_fee,
        });
    }

    if Family::find_by_id(id.clone()).one(db).await?.is_some() {
        return Err(Error::Validation {
            message: format!("Family '{id}' already exists"),
        });
    }

    let model = family::ActiveModel {
        id: Set(id),
        name: Set(new_family.name.trim().to_string()),
        guardian_name: Set(new_family.guardian_name.trim().to_string()),
        phone: Set(new_family.phone),
        monthly_fee: Set(new_family.monthly_fee),
        is_deleted: Set(false),
        created_at: Set(Utc::now()),
    };

    let result = model.insert(db).await?;
    tracing::info!("Admitted family {} ({})", result.id, result.name);
    Ok(result)
}

/// Admits a family and raises its registration charge in one transaction.
///
/// The registration charge is labelled [`REGISTRATION_LABEL`] for the current year, so the
/// ledger lists it before any tuition.
pub async fn admit_family<C>(
    db: &C,
    new_family: NewFamily,
    registration_fee: Option<f64>,
) -> Result<family::Model>
where
    C: TransactionTrait,
{
    let txn = db.begin().await?;
    let family = admit(&txn, new_family, registration_fee).await?;
    txn.commit().await?;
    Ok(family)
}

async fn admit<C>(
    db: &C,
    new_family: NewFamily,
    registration_fee: Option<f64>,
) -> Result<family::Model>
where
    C: ConnectionTrait,
{
    let family = create_family(db, new_family).await?;
    if let Some(amount) = registration_fee {
        fee::create_fee(db, &family.id, REGISTRATION_LABEL, Utc::now().year(), amount).await?;
    }
    Ok(family)
}

/// Finds an active family by id. Deleted families are treated as missing.
pub async fn get_family_by_id<C>(db: &C, family_id: &str) -> Result<Option<family::Model>>
where
    C: ConnectionTrait,
{
    Ok(Family::find_by_id(family_id.to_string())
        .one(db)
        .await?
        .filter(|f| !f.is_deleted))
}

/// Like [`get_family_by_id`], but a missing family is an error.
pub async fn require_family<C>(db: &C, family_id: &str) -> Result<family::Model>
where
    C: ConnectionTrait,
{
    get_family_by_id(db, family_id)
        .await?
        .ok_or_else(|| Error::FamilyNotFound {
            id: family_id.to_string(),
        })
}

/// Retrieves all active families ordered by id.
pub async fn get_all_active_families<C>(db: &C) -> Result<Vec<family::Model>>
where
    C: ConnectionTrait,
{
    Family::find()
        .filter(family::Column::IsDeleted.eq(false))
        .order_by_asc(family::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Soft-deletes a family. Its fee history stays readable for receipts.
pub async fn delete_family<C>(db: &C, family_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let family = require_family(db, family_id).await?;
    let mut active: family::ActiveModel = family.into();
    active.is_deleted = Set(true);
    active.update(db).await?;
    tracing::info!("Deleted family {family_id}");
    Ok(())
}

/// Seeds families, students and registration fees from configuration.
///
/// Each family is admitted together with its registration fee and students in one
/// transaction. Families that already exist are left untouched, so seeding is safe to run
/// on every start. Returns the number of families created.
pub async fn seed_families(db: &DatabaseConnection, config: &SchoolConfig) -> Result<usize> {
    let mut created = 0;

    for family_config in &config.families {
        if Family::find_by_id(family_config.id.clone()).one(db).await?.is_some() {
            tracing::debug!("Family {} already present, skipping seed", family_config.id);
            continue;
        }

        let txn = db.begin().await?;
        let family = admit(
            &txn,
            NewFamily {
                id: family_config.id.clone(),
                name: family_config.name.clone(),
                guardian_name: family_config.guardian_name.clone(),
                phone: family_config.phone.clone(),
                monthly_fee: family_config.monthly_fee,
            },
            family_config.registration_fee,
        )
        .await?;

        for student_config in &family_config.students {
            student::create_student(
                &txn,
                &family.id,
                student_config.name.clone(),
                student_config.class_name.clone(),
                student_config.roll_number.clone(),
            )
            .await?;
        }
        txn.commit().await?;

        created += 1;
    }

    Ok(created)
}
