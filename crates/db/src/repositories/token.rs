//! Session token repository.
//!
//! Issued tokens are stored as SHA-256 hex digests; the plaintext only ever
//! lives in the client's header or cookie.

use chrono::{DateTime, Utc};
use pagedesk_shared::types::{TokenId, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, sea_query::Expr,
};
use sha2::{Digest, Sha256};

use crate::entities::tokens;

/// Token repository.
#[derive(Debug, Clone)]
pub struct TokenRepository {
    db: DatabaseConnection,
}

impl TokenRepository {
    /// Creates a new token repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Hashes a session token for storage.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Persists a newly issued token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<tokens::Model, DbErr> {
        let record = tokens::ActiveModel {
            id: Set(TokenId::new().into_inner()),
            user_id: Set(user_id.into_inner()),
            token_hash: Set(Self::hash_token(token)),
            expires_at: Set(expires_at.into()),
            revoked_at: Set(None),
            created_at: Set(Utc::now().into()),
        };

        record.insert(&self.db).await
    }

    /// Finds the row of a token that is neither revoked nor expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_active(&self, token: &str) -> Result<Option<tokens::Model>, DbErr> {
        tokens::Entity::find()
            .filter(tokens::Column::TokenHash.eq(Self::hash_token(token)))
            .filter(tokens::Column::RevokedAt.is_null())
            .filter(tokens::Column::ExpiresAt.gt(Utc::now()))
            .one(&self.db)
            .await
    }

    /// Lists a user's active tokens, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<tokens::Model>, DbErr> {
        tokens::Entity::find()
            .filter(tokens::Column::UserId.eq(user_id.into_inner()))
            .filter(tokens::Column::RevokedAt.is_null())
            .filter(tokens::Column::ExpiresAt.gt(Utc::now()))
            .order_by_desc(tokens::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    /// Counts a user's active tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_active_for_user(&self, user_id: UserId) -> Result<u64, DbErr> {
        tokens::Entity::find()
            .filter(tokens::Column::UserId.eq(user_id.into_inner()))
            .filter(tokens::Column::RevokedAt.is_null())
            .filter(tokens::Column::ExpiresAt.gt(Utc::now()))
            .count(&self.db)
            .await
    }

    /// Revokes a token. Returns false if it was unknown or already revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_by_token(&self, token: &str) -> Result<bool, DbErr> {
        let result = tokens::Entity::update_many()
            .col_expr(tokens::Column::RevokedAt, Expr::value(Utc::now()))
            .filter(tokens::Column::TokenHash.eq(Self::hash_token(token)))
            .filter(tokens::Column::RevokedAt.is_null())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Revokes every active token of a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64, DbErr> {
        let result = tokens::Entity::update_many()
            .col_expr(tokens::Column::RevokedAt, Expr::value(Utc::now()))
            .filter(tokens::Column::UserId.eq(user_id.into_inner()))
            .filter(tokens::Column::RevokedAt.is_null())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Deletes expired and revoked tokens (for maintenance).
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn purge_expired(&self) -> Result<u64, DbErr> {
        let result = tokens::Entity::delete_many()
            .filter(
                Condition::any()
                    .add(tokens::Column::ExpiresAt.lt(Utc::now()))
                    .add(tokens::Column::RevokedAt.is_not_null()),
            )
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_token_is_hex_sha256() {
        let hash = TokenRepository::hash_token("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_token_differs_per_token() {
        assert_ne!(
            TokenRepository::hash_token("a.b.c"),
            TokenRepository::hash_token("a.b.d")
        );
    }
}
