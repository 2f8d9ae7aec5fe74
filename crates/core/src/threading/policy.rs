//! The threading window policy.

use chrono::{DateTime, Duration, Utc};

use crate::threading::types::{CandidateConversation, ConversationState, ThreadDecision};

/// Length of the inactivity window, in hours.
pub const THREADING_WINDOW_HOURS: i64 = 24;

/// Decides whether an inbound message continues or starts a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadingPolicy {
    window: Duration,
}

impl Default for ThreadingPolicy {
    fn default() -> Self {
        Self {
            window: Duration::hours(THREADING_WINDOW_HOURS),
        }
    }
}

impl ThreadingPolicy {
    /// Creates a policy with a custom window.
    #[must_use]
    pub const fn with_window(window: Duration) -> Self {
        Self { window }
    }

    /// The inactivity window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Returns true if `later` is less than one window after `earlier`.
    ///
    /// Any instant before `earlier` is inside.
    #[must_use]
    pub fn is_within_window(&self, earlier: DateTime<Utc>, later: DateTime<Utc>) -> bool {
        later - earlier < self.window
    }

    /// State of a conversation with the given watermark as seen at `now`.
    #[must_use]
    pub fn state_at(
        &self,
        last_message_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> ConversationState {
        if self.is_within_window(last_message_at, now) {
            ConversationState::Open
        } else {
            ConversationState::Dormant
        }
    }

    /// Returns true if a message at `at` belongs to `conv`.
    ///
    /// The message must arrive less than one window after the last customer
    /// message, and must not precede the first one by a full window or more.
    #[must_use]
    pub fn covers(&self, conv: &CandidateConversation, at: DateTime<Utc>) -> bool {
        self.is_within_window(conv.last_message_at, at)
            && self.is_within_window(at, conv.first_message_at)
    }

    /// Matches a message received at `received_at` against the candidate conversation.
    #[must_use]
    pub fn decide(
        &self,
        candidate: Option<&CandidateConversation>,
        received_at: DateTime<Utc>,
    ) -> ThreadDecision {
        match candidate {
            Some(conv) if self.covers(conv, received_at) => ThreadDecision::Continue {
                conversation_id: conv.conversation_id,
                last_message_at: conv.last_message_at.max(received_at),
            },
            _ => ThreadDecision::Start {
                last_message_at: received_at,
            },
        }
    }
}
