use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Back-office account. The bcrypt hash never leaves the process.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminAccount {
    pub id: i64,
    pub user_id: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAdminAccount {
    pub user_id: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub user_id: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub user_id: String,
    pub role: String,
    pub expires_at: i64,
}
