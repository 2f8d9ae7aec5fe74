//! Inbox query layer: the read side of conversations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use pagedesk_core::threading::{ConversationState, ThreadingPolicy};
use pagedesk_shared::types::{ConversationId, UserId};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{conversations, facebook_pages, messages};

/// A conversation with its most recent message, as listed in the inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationSummary {
    /// Conversation id.
    pub id: ConversationId,
    /// External page id.
    pub page_id: String,
    /// External customer id.
    pub customer_id: String,
    /// Customer display name.
    pub customer_name: String,
    /// Body of the latest message, empty if there is none.
    pub last_message: String,
    /// Time of the latest message, or the conversation watermark.
    pub last_message_time: DateTime<Utc>,
    /// Always 0: read state is not tracked.
    pub unread_count: u32,
    /// Whether a new customer message would still join this conversation.
    pub state: ConversationState,
}

/// Read-only inbox queries.
#[derive(Debug, Clone)]
pub struct InboxRepository {
    db: DatabaseConnection,
    policy: ThreadingPolicy,
}

impl InboxRepository {
    /// Creates an inbox repository using the default threading window.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            policy: ThreadingPolicy::default(),
        }
    }

    /// Lists the conversations of every page the user owns, most recent activity first.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ConversationSummary>, DbErr> {
        let page_ids = self.owned_page_ids(user_id).await?;
        self.list_for_pages(&page_ids, Utc::now()).await
    }

    /// Lists the conversations of the given pages, most recent activity first.
    ///
    /// `now` decides each conversation's [`ConversationState`].
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn list_for_pages(
        &self,
        page_ids: &[String],
        now: DateTime<Utc>,
    ) -> Result<Vec<ConversationSummary>, DbErr> {
        if page_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conversations = conversations::Entity::find()
            .filter(conversations::Column::PageId.is_in(page_ids.iter().map(String::as_str)))
            .order_by_desc(conversations::Column::LastMessageAt)
            .order_by_desc(conversations::Column::Id)
            .all(&self.db)
            .await?;

        let ids: Vec<Uuid> = conversations.iter().map(|c| c.id).collect();
        let latest = self.latest_messages(&ids).await?;

        Ok(conversations
            .into_iter()
            .map(|conv| {
                let watermark = conv.last_message_at.with_timezone(&Utc);
                let (last_message, last_message_time) = match latest.get(&conv.id) {
                    Some(msg) => (msg.body.clone(), msg.created_at.with_timezone(&Utc)),
                    None => (String::new(), watermark),
                };
                ConversationSummary {
                    id: ConversationId::from_uuid(conv.id),
                    page_id: conv.page_id,
                    customer_id: conv.customer_id,
                    customer_name: conv.customer_name,
                    last_message,
                    last_message_time,
                    unread_count: 0,
                    state: self.policy.state_at(watermark, now),
                }
            })
            .collect())
    }

    /// Finds a conversation only if it belongs to one of the user's pages.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn find_for_user(
        &self,
        user_id: UserId,
        conversation_id: ConversationId,
    ) -> Result<Option<conversations::Model>, DbErr> {
        let page_ids = self.owned_page_ids(user_id).await?;
        if page_ids.is_empty() {
            return Ok(None);
        }

        conversations::Entity::find_by_id(conversation_id.into_inner())
            .filter(conversations::Column::PageId.is_in(page_ids))
            .one(&self.db)
            .await
    }

    /// Lists a conversation's messages in chronological order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<messages::Model>, DbErr> {
        messages::Entity::find()
            .filter(messages::Column::ConversationId.eq(conversation_id.into_inner()))
            .order_by_asc(messages::Column::CreatedAt)
            .order_by_asc(messages::Column::Id)
            .all(&self.db)
            .await
    }

    async fn owned_page_ids(&self, user_id: UserId) -> Result<Vec<String>, DbErr> {
        facebook_pages::Entity::find()
            .select_only()
            .column(facebook_pages::Column::PageId)
            .filter(facebook_pages::Column::UserId.eq(user_id.into_inner()))
            .into_tuple()
            .all(&self.db)
            .await
    }

    /// Latest message per conversation, in one `DISTINCT ON` query.
    async fn latest_messages(
        &self,
        conversation_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, messages::Model>, DbErr> {
        if conversation_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = messages::Entity::find()
            .filter(messages::Column::ConversationId.is_in(conversation_ids.iter().copied()))
            .distinct_on([messages::Column::ConversationId])
            .order_by_asc(messages::Column::ConversationId)
            .order_by_desc(messages::Column::CreatedAt)
            .order_by_desc(messages::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(|m| (m.conversation_id, m)).collect())
    }
}
