//! Inbox routes: conversation list, message history and agent replies.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::{ApiError, AppState, middleware::AuthUser};
use pagedesk_db::{
    ConversationRepository, InboxRepository, PageRepository, UserRepository,
    entities::{conversations, sea_orm_active_enums::DeliveryStatus},
    repositories::AgentReply,
};
use pagedesk_shared::types::{ConversationId, MessageId};

/// Creates the inbox router (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/conversations", get(list_conversations))
        .route(
            "/conversations/{id}/messages",
            get(list_messages).post(send_message),
        )
}

/// Body of an agent reply.
#[derive(Debug, Default, Deserialize)]
pub struct SendMessageRequest {
    /// Reply text.
    #[serde(default)]
    pub message: String,
}

/// Loads a conversation the caller may see, or 404.
async fn owned_conversation(
    state: &AppState,
    auth: &AuthUser,
    id: ConversationId,
) -> Result<conversations::Model, ApiError> {
    InboxRepository::new((*state.db).clone())
        .find_for_user(auth.user_id(), id)
        .await?
        .ok_or_else(|| ApiError::not_found("Conversation not found"))
}

/// GET /conversations - Conversations of the caller's pages, latest activity first.
async fn list_conversations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let conversations = InboxRepository::new((*state.db).clone())
        .list_for_user(auth.user_id())
        .await?;

    Ok(Json(json!({ "conversations": conversations })))
}

/// GET /conversations/{id}/messages - Messages in chronological order.
async fn list_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<ConversationId>,
) -> Result<Json<Value>, ApiError> {
    owned_conversation(&state, &auth, id).await?;
    let messages = InboxRepository::new((*state.db).clone())
        .list_messages(id)
        .await?;

    Ok(Json(json!({ "messages": messages })))
}

/// POST /conversations/{id}/messages - Store an agent reply, then send it.
///
/// The reply is stored as `pending` before the send. A failed send keeps the
/// message (marked `failed`) and answers 500 `message_not_sent`.
async fn send_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<ConversationId>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<Value>, ApiError> {
    let text = payload.message.trim();
    if text.is_empty() {
        return Err(ApiError::validation("Message is required"));
    }

    let conversation = owned_conversation(&state, &auth, id).await?;
    let page = PageRepository::new((*state.db).clone())
        .find_owned(auth.user_id(), &conversation.page_id)
        .await?
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::CONFLICT,
                "page_not_linked",
                "No page credential is linked for this conversation",
            )
        })?;

    let agent = UserRepository::new((*state.db).clone())
        .find_by_id(auth.user_id())
        .await?;
    let sender_name = agent.map_or_else(|| page.page_name.clone(), |u| u.name);

    let repo = ConversationRepository::new((*state.db).clone());
    let pending = repo
        .record_agent_message(
            id,
            AgentReply {
                sender_name: &sender_name,
                body: text,
                sent_at: Utc::now(),
            },
        )
        .await?;
    let message_id = MessageId::from_uuid(pending.id);

    match state
        .gateway
        .send_message(&page.access_token, &conversation.customer_id, text)
        .await
    {
        Ok(receipt) => {
            let sent = repo
                .mark_delivery(message_id, DeliveryStatus::Sent, Some(receipt.message_id))
                .await?;
            info!(
                user_id = %auth.user_id(),
                conversation_id = %id,
                message_id = %message_id,
                "reply sent"
            );
            Ok(Json(json!({ "message": sent })))
        }
        Err(e) => {
            warn!(
                user_id = %auth.user_id(),
                conversation_id = %id,
                page_id = %page.page_id,
                error = %e,
                "reply not delivered"
            );
            let failed = match repo
                .mark_delivery(message_id, DeliveryStatus::Failed, None)
                .await
            {
                Ok(m) => m,
                Err(mark_err) => {
                    warn!(message_id = %message_id, error = %mark_err, "failed to mark delivery");
                    pending
                }
            };
            Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "message_not_sent",
                "Message not sent",
            )
            .with_detail(e.to_string())
            .with_data(json!({ "message": failed })))
        }
    }
}
