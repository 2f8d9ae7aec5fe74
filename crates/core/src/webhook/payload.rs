//! Webhook payload types and normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sender name used when the platform does not provide one.
pub const DEFAULT_SENDER_NAME: &str = "Facebook User";

/// Errors raised while reading a webhook body.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The body is not a valid webhook document.
    #[error("malformed webhook payload: {0}")]
    Malformed(String),
}

/// Top-level webhook delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Subscription object, `"page"` for Messenger.
    pub object: String,
    /// One entry per page with pending events.
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

impl WebhookPayload {
    /// Parses a raw request body.
    ///
    /// # Errors
    ///
    /// Returns `PayloadError::Malformed` if the body is not valid JSON of
    /// the expected shape.
    pub fn from_slice(body: &[u8]) -> Result<Self, PayloadError> {
        serde_json::from_slice(body).map_err(|e| PayloadError::Malformed(e.to_string()))
    }

    /// Returns true if the delivery concerns pages.
    #[must_use]
    pub fn is_page_subscription(&self) -> bool {
        self.object == "page"
    }
}

/// Events for a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEntry {
    /// External id of the page.
    pub id: String,
    /// Delivery time in epoch milliseconds.
    #[serde(default)]
    pub time: Option<i64>,
    /// Messaging events.
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

/// A single messaging event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagingEvent {
    /// Who sent the event.
    pub sender: Participant,
    /// Who received the event.
    #[serde(default)]
    pub recipient: Option<Participant>,
    /// Event time in epoch milliseconds.
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// The message, absent for delivery/read/postback events.
    #[serde(default)]
    pub message: Option<WebhookMessage>,
}

/// Sender or recipient of an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Page-scoped id.
    pub id: String,
    /// Display name, rarely present.
    #[serde(default)]
    pub name: Option<String>,
}

/// Message content of an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookMessage {
    /// Platform message id.
    #[serde(default)]
    pub mid: Option<String>,
    /// Text body, absent for attachment-only messages.
    #[serde(default)]
    pub text: Option<String>,
    /// Set when the page itself sent the message.
    #[serde(default)]
    pub is_echo: bool,
}

/// A customer message ready for threading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// External id of the receiving page.
    pub page_id: String,
    /// External id of the customer.
    pub sender_id: String,
    /// Customer display name.
    pub sender_name: String,
    /// Message text.
    pub text: String,
    /// When the message was sent.
    pub received_at: DateTime<Utc>,
    /// Platform message id, used to drop redeliveries.
    pub external_id: Option<String>,
}

/// Result of normalizing a delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
    /// Customer text messages, in delivery order.
    pub events: Vec<InboundEvent>,
    /// Events that carry nothing to thread (echoes, receipts, attachments).
    pub skipped: usize,
}

/// Flattens a delivery into customer text messages.
///
/// Every event of every entry is considered. Echoes of the page's own
/// messages and events without text are counted as skipped. Events without
/// a timestamp are stamped with `now`.
#[must_use]
pub fn normalize(payload: &WebhookPayload, now: DateTime<Utc>) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();
    if !payload.is_page_subscription() {
        return batch;
    }

    for entry in &payload.entry {
        for event in &entry.messaging {
            match to_inbound(entry, event, now) {
                Some(inbound) => batch.events.push(inbound),
                None => batch.skipped += 1,
            }
        }
    }
    batch
}

fn to_inbound(
    entry: &WebhookEntry,
    event: &MessagingEvent,
    now: DateTime<Utc>,
) -> Option<InboundEvent> {
    let message = event.message.as_ref()?;
    if message.is_echo || event.sender.id == entry.id {
        return None;
    }
    let text = message.text.as_deref().filter(|t| !t.trim().is_empty())?;

    let received_at = event
        .timestamp
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or(now);
    let sender_name = event
        .sender
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string());

    Some(InboundEvent {
        page_id: entry.id.clone(),
        sender_id: event.sender.id.clone(),
        sender_name,
        text: text.to_string(),
        received_at,
        external_id: message.mid.clone(),
    })
}
