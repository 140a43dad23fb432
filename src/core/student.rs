//! Student business logic - Enrolment under a family.

use crate::{
    core::family,
    entities::{Student, student},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Enrols a student under an existing family.
pub async fn create_student<C>(
    db: &C,
    family_id: &str,
    name: String,
    class_name: String,
    roll_number: Option<String>,
) -> Result<student::Model>
where
    C: ConnectionTrait,
{
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Student name cannot be empty".to_string(),
        });
    }

    family::require_family(db, family_id).await?;

    let model = student::ActiveModel {
        family_id: Set(family_id.to_string()),
        name: Set(name.trim().to_string()),
        class_name: Set(class_name.trim().to_string()),
        roll_number: Set(roll_number),
        is_deleted: Set(false),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Lists the active students of a family in enrolment order.
pub async fn get_students_for_family<C>(db: &C, family_id: &str) -> Result<Vec<student::Model>>
where
    C: ConnectionTrait,
{
    Student::find()
        .filter(student::Column::FamilyId.eq(family_id))
        .filter(student::Column::IsDeleted.eq(false))
        .order_by_asc(student::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
