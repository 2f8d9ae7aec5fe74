//! Authentication types for session tokens and auth payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// JWT claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Token ID, unique per issued session.
    pub jti: Uuid,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }
}

/// Registration request payload.
///
/// Fields default to empty so that missing fields surface as a 400 from
/// [`RegisterRequest::validate`] instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// User email.
    #[serde(default)]
    pub email: String,
    /// User password.
    #[serde(default)]
    pub password: String,
}

impl RegisterRequest {
    /// Checks that every field is present and returns the normalized email.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when a field is blank.
    pub fn validate(&self) -> AppResult<String> {
        if self.name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.password.is_empty()
        {
            return Err(AppError::Validation("All fields are required".to_string()));
        }
        Ok(normalize_email(&self.email))
    }
}

/// Login request payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    /// User email.
    #[serde(default)]
    pub email: String,
    /// User password.
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    /// Checks that both credentials are present and returns the normalized email.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when a field is blank.
    pub fn validate(&self) -> AppResult<String> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::Validation(
                "Email and password are required".to_string(),
            ));
        }
        Ok(normalize_email(&self.email))
    }
}

/// Lower-cases and trims an email address.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Login response payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Session token, also set as the `token` cookie.
    pub token: String,
    /// Authenticated user info.
    pub user: UserInfo,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// User info returned in auth responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserInfo {
    /// User ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// User email.
    pub email: String,
}
