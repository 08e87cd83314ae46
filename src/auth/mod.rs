//! Administrator authentication: bcrypt credentials, stateless signed
//! session tokens carried in the `accesstoken` cookie, and the guard that
//! protects every admin route.

pub mod cookie;
pub mod guard;
pub mod session;

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    error::{AppError, AppResult},
    models::{AdminAccount, NewAdminAccount, SessionInfo},
    repository::AdminRepository,
};

pub use guard::{AdminSession, require_admin};
pub use session::{
    Claims, FixedClock, SessionClock, SessionIssuer, SessionSecret, SystemClock,
};

pub const DEFAULT_ROLE: &str = "admin";
const INVALID_CREDENTIALS: &str = "invalid user id or password";

/// Verifies administrator credentials and the sessions issued for them.
#[derive(Clone)]
pub struct Authenticator {
    admins: Arc<dyn AdminRepository>,
    sessions: SessionIssuer,
    bcrypt_cost: u32,
    secure_cookie: bool,
}

impl Authenticator {
    pub fn new(
        admins: Arc<dyn AdminRepository>,
        sessions: SessionIssuer,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            admins,
            sessions,
            bcrypt_cost,
            secure_cookie: false,
        }
    }

    pub fn with_secure_cookie(mut self, secure: bool) -> Self {
        self.secure_cookie = secure;
        self
    }

    /// Unknown users and wrong passwords fail with the same message.
    pub async fn login(&self, user_id: &str, password: &str) -> AppResult<(String, SessionInfo)> {
        let Some(account) = self.admins.find_by_user_id(user_id).await? else {
            warn!(user_id, "login for unknown admin");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        };

        if !verify_password(password, &account.password_hash).await? {
            warn!(user_id, "login with wrong password");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }

        let (token, claims) = self.sessions.issue(&account.user_id, &account.role)?;
        info!(user_id, "admin logged in");
        Ok((
            token,
            SessionInfo {
                user_id: claims.sub,
                role: claims.role,
                expires_at: claims.exp,
            },
        ))
    }

    pub fn verify(&self, token: &str) -> AppResult<AdminSession> {
        let claims = self.sessions.verify(token)?;
        Ok(AdminSession {
            user_id: claims.sub,
            role: claims.role,
            expires_at: claims.exp,
        })
    }

    pub async fn create_admin(
        &self,
        user_id: &str,
        password: &str,
        name: Option<String>,
    ) -> AppResult<AdminAccount> {
        validate_user_id(user_id)?;
        validate_password(password)?;

        let password_hash = hash_password(password, self.bcrypt_cost).await?;
        let account = self
            .admins
            .create(NewAdminAccount {
                user_id: user_id.to_string(),
                password_hash,
                name,
                role: DEFAULT_ROLE.to_string(),
            })
            .await?;

        info!(user_id, "admin account created");
        Ok(account)
    }

    /// Creates the account unless it already exists. Returns whether it did.
    pub async fn bootstrap(&self, user_id: &str, password: &str) -> AppResult<bool> {
        if self.admins.find_by_user_id(user_id).await?.is_some() {
            return Ok(false);
        }

        match self.create_admin(user_id, password, None).await {
            Ok(_) => Ok(true),
            // Another instance won the race.
            Err(err) if err.is_conflict() => Ok(false),
            Err(err) => Err(err),
        }
    }

    pub fn session_cookie(&self, token: &str) -> String {
        cookie::session_cookie(token, self.sessions.ttl_secs(), self.secure_cookie)
    }

    pub fn cleared_cookie(&self) -> String {
        cookie::cleared_cookie(self.secure_cookie)
    }
}

pub async fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|err| AppError::internal(format!("password hashing task failed: {err}")))?
        .map_err(|err| AppError::internal(format!("failed to hash password: {err}")))
}

async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .map_err(|err| AppError::internal(format!("password check task failed: {err}")))?;
    Ok(matches)
}

fn validate_user_id(user_id: &str) -> AppResult<()> {
    if user_id.trim().is_empty() {
        return Err(AppError::validation("user id cannot be empty"));
    }
    if user_id.len() > 100 {
        return Err(AppError::validation("user id too long (max 100 characters)"));
    }
    Ok(())
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < 8 {
        return Err(AppError::validation(
            "password must be at least 8 characters long",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    const NOW: i64 = 1_735_689_600;

    fn authenticator() -> Authenticator {
        let secret = SessionSecret::new("unit-test-secret-unit-test-secret-0123").unwrap();
        let sessions = SessionIssuer::new(&secret, 600, Arc::new(FixedClock(NOW)));
        Authenticator::new(Arc::new(MemoryStore::new()), sessions, 4)
    }

    #[tokio::test]
    async fn login_round_trip() {
        let auth = authenticator();
        auth.create_admin("owner", "correct-horse", Some("Owner".into()))
            .await
            .unwrap();

        let (token, info) = auth.login("owner", "correct-horse").await.unwrap();
        assert_eq!(info.user_id, "owner");
        assert_eq!(info.expires_at, NOW + 600);

        let session = auth.verify(&token).unwrap();
        assert_eq!(session.role, DEFAULT_ROLE);
    }

    #[tokio::test]
    async fn bad_credentials_share_one_message() {
        let auth = authenticator();
        auth.create_admin("owner", "correct-horse", None).await.unwrap();

        let wrong_password = auth.login("owner", "nope-nope").await.unwrap_err();
        let unknown_user = auth.login("ghost", "correct-horse").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(unknown_user, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn bootstrap_only_creates_once() {
        let auth = authenticator();

        assert!(auth.bootstrap("owner", "correct-horse").await.unwrap());
        assert!(!auth.bootstrap("owner", "different-pass").await.unwrap());
        assert!(auth.login("owner", "correct-horse").await.is_ok());
    }

    #[tokio::test]
    async fn weak_passwords_are_refused() {
        let auth = authenticator();
        let err = auth.create_admin("owner", "short", None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
