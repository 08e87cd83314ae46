use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::info;

use crate::{
    error::{AppError, AppResult},
    models::{
        ApiResponse, CreateEnrollmentRequest, Enrollment, ListEnrollmentsQuery,
        UpdateEnrollmentStatusRequest,
    },
    state::AppState,
};

pub async fn submit_enrollment(
    State(state): State<AppState>,
    Json(payload): Json<CreateEnrollmentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Enrollment>>)> {
    validate_submission(&payload)?;

    let enrollment = state.repos.enrollments.create(payload).await?;
    info!(id = enrollment.id, class_id = enrollment.class_id, "enrollment submitted");
    Ok((StatusCode::CREATED, Json(ApiResponse::new(enrollment))))
}

pub async fn list_enrollments(
    State(state): State<AppState>,
    Query(query): Query<ListEnrollmentsQuery>,
) -> AppResult<Json<ApiResponse<Vec<Enrollment>>>> {
    let enrollments = state.repos.enrollments.list(query.class_id).await?;
    Ok(Json(ApiResponse::new(enrollments)))
}

pub async fn list_class_enrollments(
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<Enrollment>>>> {
    let enrollments = state.repos.enrollments.list(Some(class_id)).await?;
    Ok(Json(ApiResponse::new(enrollments)))
}

pub async fn get_enrollment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Enrollment>>> {
    let enrollment = state
        .repos
        .enrollments
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found("enrollment not found"))?;
    Ok(Json(ApiResponse::new(enrollment)))
}

pub async fn update_enrollment_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateEnrollmentStatusRequest>,
) -> AppResult<Json<ApiResponse<Enrollment>>> {
    let enrollment = state
        .repos
        .enrollments
        .update_status(id, payload.status)
        .await?
        .ok_or_else(|| AppError::not_found("enrollment not found"))?;

    info!(id, status = ?enrollment.status, "enrollment status changed");
    Ok(Json(ApiResponse::new(enrollment)))
}

pub async fn delete_enrollment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    if !state.repos.enrollments.delete(id).await? {
        return Err(AppError::not_found("enrollment not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// Column widths of the enrollments table.
const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 100;
const MAX_PHONE_LEN: usize = 20;

fn ensure_present(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be blank")));
    }
    Ok(())
}

fn ensure_max_chars(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

fn validate_submission(payload: &CreateEnrollmentRequest) -> AppResult<()> {
    if payload.class_id <= 0 {
        return Err(AppError::validation("class_id must be positive"));
    }
    ensure_present("name", &payload.name)?;
    ensure_present("phone", &payload.phone)?;
    ensure_present("email", &payload.email)?;
    ensure_present("experience", &payload.experience)?;
    ensure_max_chars("name", payload.name.trim(), MAX_NAME_LEN)?;
    ensure_max_chars("phone", payload.phone.trim(), MAX_PHONE_LEN)?;
    ensure_max_chars("email", payload.email.trim(), MAX_EMAIL_LEN)?;
    if let Some(contact) = payload.emergency_contact.as_deref() {
        ensure_max_chars("emergency_contact", contact, MAX_NAME_LEN)?;
    }
    if let Some(phone) = payload.emergency_phone.as_deref() {
        ensure_max_chars("emergency_phone", phone, MAX_PHONE_LEN)?;
    }
    if !payload.email.contains('@') {
        return Err(AppError::validation("email must be a valid address"));
    }
    if !(1..=120).contains(&payload.age) {
        return Err(AppError::validation("age must be between 1 and 120"));
    }
    Ok(())
}
