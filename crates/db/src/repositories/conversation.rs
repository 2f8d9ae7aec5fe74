//! Conversation threading engine.
//!
//! Inbound customer messages are attached to the open conversation of their
//! `(page, customer)` pair or start a new one. The lookup, the decision and
//! both writes run in a single transaction that holds the pair's advisory
//! lock, so two deliveries for a new pair cannot both create a conversation
//! and a failed message insert never leaves an empty conversation behind.

use chrono::{DateTime, Duration, Utc};
use pagedesk_core::{
    threading::{CandidateConversation, ThreadDecision, ThreadKey, ThreadingPolicy},
    webhook::InboundEvent,
};
use pagedesk_shared::types::{ConversationId, MessageId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, sea_query::Expr,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    entities::{
        conversations, messages,
        sea_orm_active_enums::{DeliveryStatus, SenderType},
    },
    thread_lock::ThreadLock,
};

/// Errors raised by the threading engine.
#[derive(Debug, Error)]
pub enum ThreadingError {
    /// Conversation does not exist.
    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    /// Message does not exist.
    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Result of ingesting one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The message was stored.
    Stored {
        /// Conversation the message was attached to.
        conversation_id: ConversationId,
        /// The stored message.
        message_id: MessageId,
        /// True if the conversation was created for this message.
        started: bool,
    },
    /// A message with the same platform id was already stored.
    Duplicate,
}

/// An agent reply to be recorded before it is sent.
#[derive(Debug, Clone)]
pub struct AgentReply<'a> {
    /// Display name of the replying agent.
    pub sender_name: &'a str,
    /// Message text.
    pub body: &'a str,
    /// When the reply was submitted.
    pub sent_at: DateTime<Utc>,
}

/// Conversation repository: the write side of the inbox.
#[derive(Debug, Clone)]
pub struct ConversationRepository {
    db: DatabaseConnection,
    policy: ThreadingPolicy,
}

impl ConversationRepository {
    /// Creates a repository using the default 24 hour window.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            policy: ThreadingPolicy::default(),
        }
    }

    /// Finds a conversation by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        id: ConversationId,
    ) -> Result<Option<conversations::Model>, DbErr> {
        conversations::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
    }

    /// Threads and stores an inbound customer message.
    ///
    /// # Errors
    ///
    /// Returns `ThreadingError::Database` if any statement fails; nothing is
    /// written in that case.
    pub async fn ingest(&self, event: &InboundEvent) -> Result<IngestOutcome, ThreadingError> {
        let key = ThreadKey::new(&event.page_id, &event.sender_id);
        let lock = ThreadLock::acquire(&self.db, &key).await?;
        let txn = lock.transaction();

        if let Some(mid) = &event.external_id {
            if find_by_external_id(txn, mid).await?.is_some() {
                debug!(page_id = %event.page_id, mid = %mid, "duplicate delivery ignored");
                lock.rollback().await?;
                return Ok(IngestOutcome::Duplicate);
            }
        }

        let candidate =
            candidate_conversation(txn, &key, event.received_at, self.policy.window()).await?;
        let decision = self.policy.decide(candidate.as_ref(), event.received_at);

        let conversation_id = match decision {
            ThreadDecision::Continue {
                conversation_id,
                last_message_at,
            } => {
                set_watermark(txn, conversation_id, last_message_at).await?;
                conversation_id
            }
            ThreadDecision::Start { last_message_at } => {
                let id = ConversationId::new();
                conversations::ActiveModel {
                    id: Set(id.into_inner()),
                    page_id: Set(event.page_id.clone()),
                    customer_id: Set(event.sender_id.clone()),
                    customer_name: Set(event.sender_name.clone()),
                    last_message_at: Set(last_message_at.into()),
                    created_at: Set(Utc::now().into()),
                }
                .insert(txn)
                .await?;
                id
            }
        };

        let message_id = MessageId::new();
        let inserted = messages::ActiveModel {
            id: Set(message_id.into_inner()),
            conversation_id: Set(conversation_id.into_inner()),
            sender_id: Set(event.sender_id.clone()),
            sender_name: Set(event.sender_name.clone()),
            body: Set(event.text.clone()),
            sender_type: Set(SenderType::Customer),
            delivery_status: Set(DeliveryStatus::Received),
            external_id: Set(event.external_id.clone()),
            created_at: Set(event.received_at.into()),
        }
        .insert(txn)
        .await;

        match inserted {
            Ok(_) => {}
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                lock.rollback().await?;
                return Ok(IngestOutcome::Duplicate);
            }
            Err(e) => return Err(e.into()),
        }

        lock.commit().await?;

        let started = decision.starts_conversation();
        if started {
            info!(
                page_id = %event.page_id,
                customer_id = %event.sender_id,
                conversation_id = %conversation_id,
                "conversation started"
            );
        } else {
            debug!(
                page_id = %event.page_id,
                customer_id = %event.sender_id,
                conversation_id = %conversation_id,
                "conversation continued"
            );
        }

        Ok(IngestOutcome::Stored {
            conversation_id,
            message_id,
            started,
        })
    }

    /// Stores an agent reply as `pending`.
    ///
    /// The row exists before any send is attempted, so a failed delivery
    /// still leaves the reply in the thread. Agent replies never move the
    /// watermark: only customer messages keep a conversation open.
    ///
    /// # Errors
    ///
    /// Returns `ThreadingError::ConversationNotFound` if the conversation is gone.
    pub async fn record_agent_message(
        &self,
        conversation_id: ConversationId,
        reply: AgentReply<'_>,
    ) -> Result<messages::Model, ThreadingError> {
        let conversation = self
            .find_by_id(conversation_id)
            .await?
            .ok_or(ThreadingError::ConversationNotFound(conversation_id))?;

        let message = messages::ActiveModel {
            id: Set(MessageId::new().into_inner()),
            conversation_id: Set(conversation_id.into_inner()),
            sender_id: Set(conversation.page_id),
            sender_name: Set(reply.sender_name.to_string()),
            body: Set(reply.body.to_string()),
            sender_type: Set(SenderType::Agent),
            delivery_status: Set(DeliveryStatus::Pending),
            external_id: Set(None),
            created_at: Set(reply.sent_at.into()),
        }
        .insert(&self.db)
        .await?;

        Ok(message)
    }

    /// Records the outcome of sending an agent reply.
    ///
    /// # Errors
    ///
    /// Returns `ThreadingError::MessageNotFound` if the message is gone.
    pub async fn mark_delivery(
        &self,
        message_id: MessageId,
        status: DeliveryStatus,
        external_id: Option<String>,
    ) -> Result<messages::Model, ThreadingError> {
        let message = messages::Entity::find_by_id(message_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(ThreadingError::MessageNotFound(message_id))?;

        let mut active: messages::ActiveModel = message.into();
        active.delivery_status = Set(status);
        if external_id.is_some() {
            active.external_id = Set(external_id);
        }
        Ok(active.update(&self.db).await?)
    }
}

async fn find_by_external_id<C: ConnectionTrait>(
    db: &C,
    external_id: &str,
) -> Result<Option<messages::Model>, DbErr> {
    messages::Entity::find()
        .filter(messages::Column::ExternalId.eq(external_id))
        .one(db)
        .await
}

/// Earliest conversation of the pair whose watermark is less than one
/// window before `received_at`, with its first customer message time.
async fn candidate_conversation<C: ConnectionTrait>(
    db: &C,
    key: &ThreadKey,
    received_at: DateTime<Utc>,
    window: Duration,
) -> Result<Option<CandidateConversation>, DbErr> {
    let Some(conv) = conversations::Entity::find()
        .filter(conversations::Column::PageId.eq(key.page_id.as_str()))
        .filter(conversations::Column::CustomerId.eq(key.customer_id.as_str()))
        .filter(conversations::Column::LastMessageAt.gt(received_at - window))
        .order_by_asc(conversations::Column::LastMessageAt)
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let last_message_at = conv.last_message_at.with_timezone(&Utc);
    let first_message_at = messages::Entity::find()
        .filter(messages::Column::ConversationId.eq(conv.id))
        .filter(messages::Column::SenderType.eq(SenderType::Customer))
        .order_by_asc(messages::Column::CreatedAt)
        .one(db)
        .await?
        .map_or(last_message_at, |m| m.created_at.with_timezone(&Utc));

    Ok(Some(CandidateConversation {
        conversation_id: ConversationId::from_uuid(conv.id),
        first_message_at,
        last_message_at,
    }))
}

async fn set_watermark<C: ConnectionTrait>(
    db: &C,
    conversation_id: ConversationId,
    last_message_at: DateTime<Utc>,
) -> Result<(), DbErr> {
    conversations::Entity::update_many()
        .col_expr(
            conversations::Column::LastMessageAt,
            Expr::value(last_message_at),
        )
        .filter(conversations::Column::Id.eq(conversation_id.into_inner()))
        .exec(db)
        .await?;
    Ok(())
}
