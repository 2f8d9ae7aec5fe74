//! Property-based tests for the threading policy.

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;

use pagedesk_shared::types::ConversationId;

use super::{CandidateConversation, ThreadingPolicy};

const WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

/// Strategy for an instant in 2020..2030.
fn instant() -> impl Strategy<Value = DateTime<Utc>> {
    (1_577_836_800_000i64..1_893_456_000_000i64)
        .prop_map(|ms| DateTime::from_timestamp_millis(ms).unwrap())
}

fn latest_at(at: DateTime<Utc>) -> CandidateConversation {
    CandidateConversation {
        conversation_id: ConversationId::new(),
        first_message_at: at,
        last_message_at: at,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Two messages less than a window apart share a conversation, in either arrival order.
    #[test]
    fn prop_inside_window_continues(
        at in instant(),
        gap in 0i64..WINDOW_MS,
        forward in any::<bool>(),
    ) {
        let gap = Duration::milliseconds(if forward { gap } else { -gap });
        let latest = latest_at(at);

        let decision = ThreadingPolicy::default().decide(Some(&latest), at + gap);

        prop_assert!(!decision.starts_conversation());
    }

    /// Two messages at least a window apart never share a conversation.
    #[test]
    fn prop_outside_window_starts(
        at in instant(),
        gap in WINDOW_MS..(30 * WINDOW_MS),
        forward in any::<bool>(),
    ) {
        let gap = Duration::milliseconds(if forward { gap } else { -gap });
        let latest = latest_at(at);

        let decision = ThreadingPolicy::default().decide(Some(&latest), at + gap);

        prop_assert!(decision.starts_conversation());
        prop_assert_eq!(decision.last_message_at(), at + gap);
    }

    /// Continuing never moves the watermark backwards.
    #[test]
    fn prop_watermark_is_monotonic(at in instant(), gap in -(WINDOW_MS - 1)..WINDOW_MS) {
        let latest = latest_at(at);
        let received = at + Duration::milliseconds(gap);

        let decision = ThreadingPolicy::default().decide(Some(&latest), received);

        prop_assert!(decision.last_message_at() >= latest.last_message_at);
        prop_assert!(decision.last_message_at() >= received);
    }

    /// A message inside a conversation's span always joins it and keeps its watermark.
    #[test]
    fn prop_message_inside_span_joins(
        first in instant(),
        span in 0i64..(10 * WINDOW_MS),
        offset in 0.0f64..=1.0,
    ) {
        let last = first + Duration::milliseconds(span);
        #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
        let at = first + Duration::milliseconds((span as f64 * offset) as i64);
        let conv = CandidateConversation {
            conversation_id: ConversationId::new(),
            first_message_at: first,
            last_message_at: last,
        };

        let decision = ThreadingPolicy::default().decide(Some(&conv), at);

        prop_assert!(!decision.starts_conversation());
        prop_assert_eq!(decision.last_message_at(), last);
    }
}
