use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("resource not found: {0}")]
    NotFound(String),
    #[error("conflict: {message}")]
    Conflict {
        message: String,
        conflicting_ids: Vec<i64>,
    },
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    conflicting_ids: Vec<i64>,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            conflicting_ids: Vec::new(),
        }
    }

    /// A batch lost an optimistic-lock race. The ids are the rows whose
    /// expected version no longer matched (or that no longer exist).
    pub fn stale_versions(conflicting_ids: Vec<i64>) -> Self {
        Self::Conflict {
            message: "the list was modified concurrently; refresh and retry".to_string(),
            conflicting_ids,
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, conflicting_ids) = match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, "validation", msg, Vec::new()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, Vec::new()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, Vec::new()),
            Self::Conflict {
                message,
                conflicting_ids,
            } => (StatusCode::CONFLICT, "conflict", message, conflicting_ids),
            Self::Database(err) => match &err {
                sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => (
                    StatusCode::CONFLICT,
                    "conflict",
                    "resource already exists".to_string(),
                    Vec::new(),
                ),
                _ => {
                    tracing::error!(error = %err, "database operation failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "database_error",
                        "database operation failed".to_string(),
                        Vec::new(),
                    )
                }
            },
            Self::Migration(err) => {
                tracing::error!(error = %err, "database migration failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "database migration failed".to_string(),
                    Vec::new(),
                )
            }
            Self::Storage(msg) => {
                tracing::error!(error = %msg, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "storage operation failed".to_string(),
                    Vec::new(),
                )
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_string(),
                    Vec::new(),
                )
            }
        };

        let body = ErrorBody {
            error: message,
            code,
            conflicting_ids,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        (status, serde_json::from_slice(&body).expect("body should be JSON"))
    }

    #[tokio::test]
    async fn stale_versions_render_as_conflict_with_ids() {
        let (status, body) = render(AppError::stale_versions(vec![3, 9])).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "conflict");
        assert_eq!(body["conflicting_ids"], serde_json::json!([3, 9]));
    }

    #[tokio::test]
    async fn storage_details_are_not_leaked() {
        let (status, body) = render(AppError::storage("lock poisoned on team table")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "storage operation failed");
        assert!(body.get("conflicting_ids").is_none());
    }

    #[tokio::test]
    async fn unauthorized_maps_to_401() {
        let (status, body) = render(AppError::unauthorized("missing session")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing session");
    }
}
