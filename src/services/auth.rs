//! Login verification.
//!
//! The verifier is pluggable; the default one checks admin logins against a
//! password supplied through configuration and lets any named student in.

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    error::AppError,
    models::{Role, Session},
};

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("Username is required")]
    MissingUsername,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Admin login is not configured")]
    AdminDisabled,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingUsername => AppError::InvalidInput(err.to_string()),
            AuthError::InvalidCredentials(_) | AuthError::AdminDisabled => {
                AppError::Unauthorized(err.to_string())
            }
        }
    }
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Check a login attempt and return the session it opens
    async fn verify(
        &self,
        username: &str,
        role: Role,
        password: Option<&str>,
    ) -> Result<Session, AuthError>;

    /// Name of this verification method
    fn method_name(&self) -> &'static str;
}

/// Verifier driven by the configured admin password
pub struct ConfiguredVerifier {
    admin_password: Option<String>,
}

impl ConfiguredVerifier {
    pub fn new(admin_password: Option<String>) -> Self {
        Self {
            admin_password: admin_password.filter(|p| !p.is_empty()),
        }
    }
}

#[async_trait]
impl CredentialVerifier for ConfiguredVerifier {
    async fn verify(
        &self,
        username: &str,
        role: Role,
        password: Option<&str>,
    ) -> Result<Session, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::MissingUsername);
        }

        if role == Role::Admin {
            let expected = self.admin_password.as_ref().ok_or(AuthError::AdminDisabled)?;
            let provided = password.unwrap_or_default();
            if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
                return Err(AuthError::InvalidCredentials(
                    "Invalid admin credentials".to_string(),
                ));
            }
        }

        Ok(Session::new(username, role))
    }

    fn method_name(&self) -> &'static str {
        "configured_password"
    }
}

/// Constant-time byte comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
