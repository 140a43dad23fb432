//! `/api/families` handlers.

use crate::{
    api::{AppState, error::ApiResult},
    core::{
        family::{self, NewFamily},
        student,
    },
    entities::{family as family_entity, student as student_entity},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::info;

/// Body of `POST /api/families`
#[derive(Debug, Deserialize)]
pub struct CreateFamilyRequest {
    /// Caller-chosen family id
    pub id: String,
    /// Family name
    pub name: String,
    /// Guardian responsible for fees
    pub guardian_name: String,
    /// Contact number
    #[serde(default)]
    pub phone: Option<String>,
    /// Monthly tuition
    #[serde(default)]
    pub monthly_fee: f64,
    /// One-off registration charge
    #[serde(default)]
    pub registration_fee: Option<f64>,
}

/// Body of `POST /api/families/:id/students`
#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    /// Full name
    pub name: String,
    /// Class label
    pub class_name: String,
    /// Optional roll number
    #[serde(default)]
    pub roll_number: Option<String>,
}

/// GET /api/families
pub async fn list_families(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<family_entity::Model>>> {
    info!("GET /api/families");
    Ok(Json(family::get_all_active_families(&state.db).await?))
}

/// POST /api/families
pub async fn create_family(
    State(state): State<AppState>,
    Json(request): Json<CreateFamilyRequest>,
) -> ApiResult<(StatusCode, Json<family_entity::Model>)> {
    info!("POST /api/families - id: {}", request.id);

    let family = family::admit_family(
        &state.db,
        NewFamily {
            id: request.id,
            name: request.name,
            guardian_name: request.guardian_name,
            phone: request.phone,
            monthly_fee: request.monthly_fee,
        },
        request.registration_fee,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(family)))
}

/// GET /api/families/:id
pub async fn get_family(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
) -> ApiResult<Json<family_entity::Model>> {
    info!("GET /api/families/{family_id}");
    Ok(Json(family::require_family(&state.db, &family_id).await?))
}

/// DELETE /api/families/:id
pub async fn delete_family(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
) -> ApiResult<StatusCode> {
    info!("DELETE /api/families/{family_id}");
    family::delete_family(&state.db, &family_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/families/:id/students
pub async fn list_students(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
) -> ApiResult<Json<Vec<student_entity::Model>>> {
    info!("GET /api/families/{family_id}/students");
    family::require_family(&state.db, &family_id).await?;
    Ok(Json(
        student::get_students_for_family(&state.db, &family_id).await?,
    ))
}

/// POST /api/families/:id/students
pub async fn create_student(
    State(state): State<AppState>,
    Path(family_id): Path<String>,
    Json(request): Json<CreateStudentRequest>,
) -> ApiResult<(StatusCode, Json<student_entity::Model>)> {
    info!("POST /api/families/{family_id}/students");

    let created = student::create_student(
        &state.db,
        &family_id,
        request.name,
        request.class_name,
        request.roll_number,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}
