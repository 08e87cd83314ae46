pub mod auth;
pub mod enrollment;
pub mod team;

use axum::Json;

use crate::models::{ApiMessage, ApiResponse};

pub async fn healthcheck() -> Json<ApiResponse<ApiMessage>> {
    Json(ApiResponse::new(ApiMessage {
        message: "ok".to_string(),
    }))
}
