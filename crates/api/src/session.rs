//! Session tokens: issue, verify, revoke.
//!
//! A session token is a signed JWT that is also stored (hashed) in the
//! `tokens` table. Verification needs both: a valid signature and expiry,
//! and an active row. Revoking the row ends the session before `exp`.

use std::sync::Arc;

use pagedesk_db::TokenRepository;
use pagedesk_shared::{JwtService, jwt::SignedToken, types::UserId};
use sea_orm::{DatabaseConnection, DbErr};
use tracing::{debug, info, warn};

use crate::ApiError;

/// Session token service.
#[derive(Clone)]
pub struct SessionService {
    jwt: Arc<JwtService>,
    tokens: TokenRepository,
}

impl SessionService {
    /// Creates a session service.
    #[must_use]
    pub const fn new(jwt: Arc<JwtService>, db: DatabaseConnection) -> Self {
        Self {
            jwt,
            tokens: TokenRepository::new(db),
        }
    }

    /// Signs a token for `user_id` and persists it.
    ///
    /// Expired and revoked rows are purged on the way; a failed purge is
    /// logged and does not fail the login.
    ///
    /// # Errors
    ///
    /// Returns an error if signing or the insert fails.
    pub async fn issue_token(&self, user_id: UserId) -> Result<SignedToken, ApiError> {
        let signed = self.jwt.generate_session_token(user_id.into_inner())?;
        self.tokens
            .create(user_id, &signed.token, signed.expires_at())
            .await?;

        info!(user_id = %user_id, jti = %signed.claims.jti, "session token issued");

        match self.tokens.purge_expired().await {
            Ok(0) => {}
            Ok(purged) => debug!(purged, "stale session tokens purged"),
            Err(e) => warn!(error = %e, "failed to purge stale session tokens"),
        }

        Ok(signed)
    }

    /// Resolves a token to its user.
    ///
    /// Empty, malformed, expired, revoked and unknown tokens all yield
    /// `Ok(None)`; only a failing database lookup is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the token lookup fails.
    pub async fn verify_token(&self, token: &str) -> Result<Option<UserId>, DbErr> {
        if token.is_empty() {
            return Ok(None);
        }

        let claims = match self.jwt.validate_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "session token rejected");
                return Ok(None);
            }
        };

        let Some(record) = self.tokens.find_active(token).await? else {
            debug!(user_id = %claims.sub, "session token revoked or unknown");
            return Ok(None);
        };

        if record.user_id != claims.user_id() {
            warn!(user_id = %claims.sub, "session token bound to another user");
            return Ok(None);
        }

        Ok(Some(UserId::from_uuid(record.user_id)))
    }

    /// Revokes a token. Returns false if it was not active.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn revoke_token(&self, token: &str) -> Result<bool, DbErr> {
        if token.is_empty() {
            return Ok(false);
        }
        self.tokens.revoke_by_token(token).await
    }

    /// Token lifetime in seconds.
    #[must_use]
    pub fn token_expires_in(&self) -> i64 {
        self.jwt.token_expires_in()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagedesk_shared::JwtConfig;

    fn service() -> SessionService {
        SessionService::new(
            Arc::new(JwtService::new(JwtConfig::default())),
            DatabaseConnection::Disconnected,
        )
    }

    #[tokio::test]
    async fn test_empty_token_is_invalid_without_lookup() {
        assert_eq!(service().verify_token("").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_token_is_invalid_without_lookup() {
        assert_eq!(service().verify_token("not-a-jwt").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_signed_token_still_needs_a_session_row() {
        let service = service();
        let signed = service
            .jwt
            .generate_session_token(UserId::new().into_inner())
            .unwrap();

        // The disconnected pool fails the row lookup instead of trusting the signature.
        assert!(service.verify_token(&signed.token).await.is_err());
    }

    #[test]
    fn test_expires_in_is_seven_days() {
        assert_eq!(service().token_expires_in(), 7 * 24 * 60 * 60);
    }
}
