use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, warn};

use crate::{
    auth::AdminSession,
    error::{AppError, AppResult},
    models::{
        ApiResponse, CreateTeamMemberRequest, ReorderEntry, TeamMember, UpdateTeamMemberRequest,
        find_duplicate_ids,
    },
    state::AppState,
};

const MAX_NAME_LEN: usize = 100;
const MAX_IMAGE_LEN: usize = 500;
const MAX_DESCRIPTION_LEN: usize = 5000;

pub async fn list_team(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<TeamMember>>>> {
    let members = state.repos.team.list().await?;
    Ok(Json(ApiResponse::new(members)))
}

pub async fn create_team_member(
    State(state): State<AppState>,
    Json(payload): Json<CreateTeamMemberRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TeamMember>>)> {
    ensure_label("name", &payload.name)?;
    ensure_label("role", &payload.role)?;
    validate_image(payload.image.as_deref())?;
    validate_description(&payload.description)?;

    let member = state.repos.team.create(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::new(member))))
}

pub async fn update_team_member(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTeamMemberRequest>,
) -> AppResult<Json<ApiResponse<TeamMember>>> {
    if !payload.has_changes() {
        return Err(AppError::validation("at least one field must be provided"));
    }
    if let Some(name) = payload.name.as_deref() {
        ensure_label("name", name)?;
    }
    if let Some(role) = payload.role.as_deref() {
        ensure_label("role", role)?;
    }
    validate_image(payload.image.as_deref())?;
    if let Some(description) = payload.description.as_deref() {
        validate_description(description)?;
    }

    let member = state
        .repos
        .team
        .update(id, payload)
        .await?
        .ok_or_else(|| AppError::not_found("team member not found"))?;

    Ok(Json(ApiResponse::new(member)))
}

pub async fn delete_team_member(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    if !state.repos.team.delete(id).await? {
        return Err(AppError::not_found("team member not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Applies a drag-and-drop reorder and answers with the refreshed list, so
/// the client holds the new versions for its next change.
pub async fn reorder_team(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Json(entries): Json<Vec<ReorderEntry>>,
) -> AppResult<Json<ApiResponse<Vec<TeamMember>>>> {
    let duplicates = find_duplicate_ids(&entries);
    if !duplicates.is_empty() {
        return Err(AppError::validation(format!(
            "team member ids appear more than once: {duplicates:?}"
        )));
    }

    if !entries.is_empty() {
        if let Err(err) = state.repos.team.reorder(&entries).await {
            if err.is_conflict() {
                warn!(admin = %session.user_id, rows = entries.len(), "reorder rejected");
            }
            return Err(err);
        }
        info!(admin = %session.user_id, rows = entries.len(), "team reordered");
    }

    let members = state.repos.team.list().await?;
    Ok(Json(ApiResponse::new(members)))
}

/// Checks the label as it will be stored, i.e. trimmed.
fn ensure_label(field: &str, value: &str) -> AppResult<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} must not be blank")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_image(image: Option<&str>) -> AppResult<()> {
    if let Some(image) = image
        && image.chars().count() > MAX_IMAGE_LEN
    {
        return Err(AppError::validation(format!(
            "image must be at most {MAX_IMAGE_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> AppResult<()> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(AppError::validation(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_trimmed_before_the_blank_check() {
        assert!(ensure_label("name", "   ").is_err());
        assert!(ensure_label("name", " Kim ").is_ok());
        assert!(ensure_label("role", &"x".repeat(101)).is_err());
    }

    #[test]
    fn label_limit_ignores_surrounding_whitespace() {
        let padded = format!("  {}  ", "가".repeat(MAX_NAME_LEN));
        assert!(ensure_label("name", &padded).is_ok());
        assert!(ensure_label("name", &format!(" {}", "a".repeat(MAX_NAME_LEN + 1))).is_err());
    }

    #[test]
    fn length_limits_count_characters() {
        assert!(validate_image(Some(&"가".repeat(500))).is_ok());
        assert!(validate_image(Some(&"a".repeat(501))).is_err());
        assert!(validate_description(&"a".repeat(5001)).is_err());
    }
}
