//! Threading types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use pagedesk_shared::types::ConversationId;

/// Identity of a thread: one customer talking to one page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadKey {
    /// External id of the page that received the message.
    pub page_id: String,
    /// External id (page-scoped) of the customer.
    pub customer_id: String,
}

impl ThreadKey {
    /// Creates a thread key.
    #[must_use]
    pub fn new(page_id: impl Into<String>, customer_id: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            customer_id: customer_id.into(),
        }
    }

    /// Stable 64-bit key used to serialize writers of this thread.
    ///
    /// Derived from SHA-256 so every server process computes the same value.
    #[must_use]
    pub fn lock_key(&self) -> i64 {
        let mut hasher = Sha256::new();
        hasher.update(self.page_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.customer_id.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        i64::from_be_bytes(bytes)
    }
}

/// A stored conversation an inbound message may belong to.
///
/// For a message at `t` this is the earliest conversation of the thread
/// whose watermark is less than one window before `t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateConversation {
    /// Conversation id.
    pub conversation_id: ConversationId,
    /// Send time of its earliest customer message.
    pub first_message_at: DateTime<Utc>,
    /// Watermark of the last customer activity.
    pub last_message_at: DateTime<Utc>,
}

/// Outcome of matching an inbound message against a candidate conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadDecision {
    /// Append to an existing open conversation and move its watermark.
    Continue {
        /// Conversation to append to.
        conversation_id: ConversationId,
        /// New watermark, never earlier than the previous one.
        last_message_at: DateTime<Utc>,
    },
    /// Start a new conversation.
    Start {
        /// Watermark of the new conversation.
        last_message_at: DateTime<Utc>,
    },
}

impl ThreadDecision {
    /// The watermark the resolved conversation must carry afterwards.
    #[must_use]
    pub fn last_message_at(&self) -> DateTime<Utc> {
        match self {
            Self::Continue {
                last_message_at, ..
            }
            | Self::Start { last_message_at } => *last_message_at,
        }
    }

    /// Returns true if a new conversation has to be created.
    #[must_use]
    pub const fn starts_conversation(&self) -> bool {
        matches!(self, Self::Start { .. })
    }
}

/// Derived state of a conversation relative to an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// Within the threading window; new messages join it.
    Open,
    /// Idle for at least the window; new messages start a new conversation.
    Dormant,
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Dormant => write!(f, "dormant"),
        }
    }
}
