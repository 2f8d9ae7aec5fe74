//! Linked page repository.
//!
//! A user links at most one page. Linking again replaces the previous
//! association in place.

use chrono::Utc;
use pagedesk_shared::types::UserId;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect, Set,
    sea_query::OnConflict,
};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::entities::facebook_pages;

/// Errors raised by page writes.
#[derive(Debug, Error)]
pub enum PageError {
    /// A required field is blank.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for linking a page.
#[derive(Clone)]
pub struct LinkPageInput {
    /// External page id.
    pub page_id: String,
    /// Page display name.
    pub page_name: String,
    /// Long-lived page access token.
    pub access_token: String,
}

impl std::fmt::Debug for LinkPageInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkPageInput")
            .field("page_id", &self.page_id)
            .field("page_name", &self.page_name)
            .field("access_token", &"[hidden]")
            .finish()
    }
}

impl LinkPageInput {
    fn validate(&self) -> Result<(), PageError> {
        if self.page_id.trim().is_empty() {
            return Err(PageError::MissingField("page_id"));
        }
        if self.page_name.trim().is_empty() {
            return Err(PageError::MissingField("page_name"));
        }
        if self.access_token.trim().is_empty() {
            return Err(PageError::MissingField("access_token"));
        }
        Ok(())
    }
}

/// Page repository.
#[derive(Debug, Clone)]
pub struct PageRepository {
    db: DatabaseConnection,
}

impl PageRepository {
    /// Creates a new page repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the page linked by a user, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<facebook_pages::Model>, DbErr> {
        facebook_pages::Entity::find()
            .filter(facebook_pages::Column::UserId.eq(user_id.into_inner()))
            .one(&self.db)
            .await
    }

    /// Returns the caller's credential for an external page id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_owned(
        &self,
        user_id: UserId,
        page_id: &str,
    ) -> Result<Option<facebook_pages::Model>, DbErr> {
        facebook_pages::Entity::find()
            .filter(facebook_pages::Column::UserId.eq(user_id.into_inner()))
            .filter(facebook_pages::Column::PageId.eq(page_id))
            .one(&self.db)
            .await
    }

    /// External ids of every page the user owns.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn page_ids_for_user(&self, user_id: UserId) -> Result<Vec<String>, DbErr> {
        facebook_pages::Entity::find()
            .select_only()
            .column(facebook_pages::Column::PageId)
            .filter(facebook_pages::Column::UserId.eq(user_id.into_inner()))
            .into_tuple()
            .all(&self.db)
            .await
    }

    /// Links a page to a user, replacing any page linked before.
    ///
    /// # Errors
    ///
    /// Returns `PageError::MissingField` for blank input and
    /// `PageError::Database` if the upsert fails.
    pub async fn upsert_for_user(
        &self,
        user_id: UserId,
        input: LinkPageInput,
    ) -> Result<facebook_pages::Model, PageError> {
        input.validate()?;
        let now = Utc::now();

        let page = facebook_pages::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id.into_inner()),
            page_id: Set(input.page_id.trim().to_string()),
            page_name: Set(input.page_name.trim().to_string()),
            access_token: Set(input.access_token),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let saved = facebook_pages::Entity::insert(page)
            .on_conflict(
                OnConflict::column(facebook_pages::Column::UserId)
                    .update_columns([
                        facebook_pages::Column::PageId,
                        facebook_pages::Column::PageName,
                        facebook_pages::Column::AccessToken,
                        facebook_pages::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_with_returning(&self.db)
            .await?;

        info!(user_id = %user_id, page_id = %saved.page_id, "page linked");
        Ok(saved)
    }

    /// Unlinks the user's page. Conversations of the page are kept.
    ///
    /// Returns false if no page was linked.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete_for_user(&self, user_id: UserId) -> Result<bool, DbErr> {
        let result = facebook_pages::Entity::delete_many()
            .filter(facebook_pages::Column::UserId.eq(user_id.into_inner()))
            .exec(&self.db)
            .await?;

        if result.rows_affected > 0 {
            info!(user_id = %user_id, "page unlinked");
        }
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn input(page_id: &str, page_name: &str, access_token: &str) -> LinkPageInput {
        LinkPageInput {
            page_id: page_id.into(),
            page_name: page_name.into(),
            access_token: access_token.into(),
        }
    }

    #[rstest]
    #[case(" ", "Shop", "tok", "page_id")]
    #[case("1", "", "tok", "page_name")]
    #[case("1", "Shop", "", "access_token")]
    #[case("", "", "", "page_id")]
    fn test_validate_reports_first_missing_field(
        #[case] page_id: &str,
        #[case] page_name: &str,
        #[case] access_token: &str,
        #[case] missing: &str,
    ) {
        match input(page_id, page_name, access_token).validate() {
            Err(PageError::MissingField(field)) => assert_eq!(field, missing),
            other => panic!("expected missing {missing}, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_accepts_complete_input() {
        assert!(input("1", "Shop", "tok").validate().is_ok());
    }

    #[test]
    fn test_debug_hides_access_token() {
        let debug = format!("{:?}", input("1", "Shop", "EAAsecret"));
        assert!(!debug.contains("EAAsecret"));
    }
}
