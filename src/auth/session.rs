use std::{collections::HashSet, fmt, sync::Arc};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const MIN_SECRET_LEN: usize = 32;

/// Source of "now" for issuing and expiring sessions.
pub trait SessionClock: Send + Sync {
    fn now_epoch_secs(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SessionClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl SessionClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}

/// HMAC key for session tokens. Never printed.
#[derive(Clone)]
pub struct SessionSecret(SecretString);

impl SessionSecret {
    pub fn new(secret: impl Into<String>) -> AppResult<Self> {
        let secret = secret.into();
        if secret.len() < MIN_SECRET_LEN {
            return Err(AppError::validation(format!(
                "session secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.expose_secret().as_bytes()
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret([REDACTED])")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and checks HS256 session tokens against an injected clock.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
    clock: Arc<dyn SessionClock>,
}

impl SessionIssuer {
    pub fn new(secret: &SessionSecret, ttl_secs: i64, clock: Arc<dyn SessionClock>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
            clock,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    pub fn issue(&self, subject: &str, role: &str) -> AppResult<(String, Claims)> {
        let now = self.clock.now_epoch_secs();
        let claims = Claims {
            sub: subject.to_string(),
            role: role.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| AppError::internal(format!("failed to sign session: {err}")))?;
        Ok((token, claims))
    }

    /// Checks the signature, then expiry against our own clock.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string(), "sub".to_string()]);

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| AppError::unauthorized("invalid session"))?
            .claims;

        if claims.exp <= self.clock.now_epoch_secs() {
            return Err(AppError::unauthorized("session expired"));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_735_689_600;

    fn secret() -> SessionSecret {
        SessionSecret::new("a-test-secret-that-is-long-enough-for-hs256").unwrap()
    }

    fn issuer_at(now: i64) -> SessionIssuer {
        SessionIssuer::new(&secret(), 3600, Arc::new(FixedClock(now)))
    }

    #[test]
    fn issued_token_verifies_within_ttl() {
        let (token, issued) = issuer_at(NOW).issue("owner", "admin").unwrap();

        let claims = issuer_at(NOW + 3599).verify(&token).unwrap();

        assert_eq!(claims, issued);
        assert_eq!(claims.exp, NOW + 3600);
    }

    #[test]
    fn token_is_rejected_once_expired() {
        let (token, _) = issuer_at(NOW).issue("owner", "admin").unwrap();

        let err = issuer_at(NOW + 3600).verify(&token).unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let other = SessionSecret::new("another-secret-that-is-also-long-enough").unwrap();
        let (token, _) = SessionIssuer::new(&other, 3600, Arc::new(FixedClock(NOW)))
            .issue("owner", "admin")
            .unwrap();

        assert!(issuer_at(NOW).verify(&token).is_err());
        assert!(issuer_at(NOW).verify("not-a-token").is_err());
    }

    #[test]
    fn short_secrets_are_refused() {
        assert!(SessionSecret::new("short").is_err());
        assert_eq!(format!("{:?}", secret()), "SessionSecret([REDACTED])");
    }
}
