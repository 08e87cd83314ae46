use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header::SET_COOKIE},
    response::IntoResponse,
};
use tracing::info;

use crate::{
    auth::cookie,
    error::{AppError, AppResult},
    models::{ApiMessage, ApiResponse, LoginRequest, SessionInfo},
    state::AppState,
};

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    if payload.user_id.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("user_id and password are required"));
    }

    let (token, session) = state.auth.login(payload.user_id.trim(), &payload.password).await?;
    Ok((
        [(SET_COOKIE, state.auth.session_cookie(&token))],
        Json(ApiResponse::new(session)),
    ))
}

/// Sessions are stateless, so logging out only drops the cookie.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    info!("admin logged out");
    (
        [(SET_COOKIE, state.auth.cleared_cookie())],
        Json(ApiResponse::new(ApiMessage {
            message: "logged out".to_string(),
        })),
    )
}

pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<SessionInfo>>> {
    let token = cookie::session_token(&headers)
        .ok_or_else(|| AppError::unauthorized("login required"))?;
    let session = state.auth.verify(token)?;
    Ok(Json(ApiResponse::new(session.into())))
}
