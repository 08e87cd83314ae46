use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::{Authenticator, cookie};
use crate::{error::AppError, models::SessionInfo};

/// The verified administrator behind the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub user_id: String,
    pub role: String,
    pub expires_at: i64,
}

impl From<AdminSession> for SessionInfo {
    fn from(session: AdminSession) -> Self {
        Self {
            user_id: session.user_id,
            role: session.role,
            expires_at: session.expires_at,
        }
    }
}

/// Rejects the request with 401 unless it carries a valid session cookie.
/// Runs before the handler, so a rejected request never reaches storage.
pub async fn require_admin(
    State(auth): State<Authenticator>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = cookie::session_token(request.headers()) else {
        debug!(path = %request.uri().path(), "admin request without session cookie");
        return Err(AppError::unauthorized("login required"));
    };

    let session = auth.verify(token)?;
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
