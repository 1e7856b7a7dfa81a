use crate::database::credential::CredentialRepository;
use crate::error::app_error::AppError;
use crate::models::auth::SessionStatusResponse;
use crate::service::session::{SessionCheck, SessionManager, token_prefix};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, warn};

static PIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{4}$").expect("PIN pattern is valid"));

pub fn is_valid_pin(pin: &str) -> bool {
    PIN_PATTERN.is_match(pin)
}

/// Result of a PIN check. A wrong PIN is an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Valid { token: String, expires_at: DateTime<Utc> },
    Invalid,
}

async fn hash_pin(pin: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(pin.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(AppError::from)
    })
    .await
    .map_err(|e| AppError::PasswordHash {
        message: format!("PIN hashing task failed: {e}"),
    })?
}

async fn pin_matches(pin: String, stored_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || -> Result<bool, AppError> {
        let parsed = PasswordHash::new(&stored_hash)?;
        Ok(Argon2::default().verify_password(pin.as_bytes(), &parsed).is_ok())
    })
    .await
    .map_err(|e| AppError::PasswordHash {
        message: format!("PIN verification task failed: {e}"),
    })?
}

pub struct AuthService<'a, R> {
    repository: &'a R,
    sessions: &'a SessionManager,
}

impl<'a, R> AuthService<'a, R>
where
    R: CredentialRepository + Sync,
{
    pub fn new(repository: &'a R, sessions: &'a SessionManager) -> Self {
        AuthService { repository, sessions }
    }

    pub async fn is_setup(&self) -> Result<bool, AppError> {
        self.repository.credential_exists().await
    }

    pub async fn setup(&self, pin: &str) -> Result<(), AppError> {
        if !is_valid_pin(pin) {
            return Err(AppError::BadRequest("PIN must be exactly 4 digits".to_string()));
        }
        if self.repository.credential_exists().await? {
            return Err(AppError::PinAlreadySetup);
        }

        let pin_hash = hash_pin(pin.to_string()).await?;
        // Two concurrent setups can both pass the check above; the insert settles it.
        if self.repository.create_credential(&pin_hash).await?.is_none() {
            return Err(AppError::PinAlreadySetup);
        }

        info!("PIN configured");
        Ok(())
    }

    pub async fn verify(&self, pin: &str) -> Result<VerifyOutcome, AppError> {
        let credential = self.repository.get_credential().await?.ok_or(AppError::PinNotSetup)?;

        if !is_valid_pin(pin) || !pin_matches(pin.to_string(), credential.pin_hash).await? {
            warn!("PIN verification failed");
            return Ok(VerifyOutcome::Invalid);
        }

        let issued = self.sessions.issue().await;
        Ok(VerifyOutcome::Valid {
            token: issued.token,
            expires_at: issued.session.expires_at,
        })
    }

    /// Never fails: an absent, unknown or expired token is simply not valid.
    pub async fn session_status(&self, token: Option<&str>) -> SessionStatusResponse {
        let check = match token {
            Some(token) => self.sessions.validate(token).await,
            None => SessionCheck::Missing,
        };

        match check {
            SessionCheck::Valid(session) => SessionStatusResponse {
                valid: true,
                expires_at: Some(session.expires_at.timestamp_millis()),
            },
            SessionCheck::Missing | SessionCheck::Expired => SessionStatusResponse { valid: false, expires_at: None },
        }
    }

    pub async fn logout(&self, token: &str) -> bool {
        let revoked = self.sessions.revoke(token).await;
        if !revoked {
            info!(token = %token_prefix(token), "logout for unknown session");
        }
        revoked
    }
}
