//! Conversation threading.
//!
//! Inbound messages are grouped into conversations per `(page, customer)`
//! pair. A conversation stays open while new messages arrive within the
//! threading window of its last activity; after that it goes dormant and the
//! next message starts a fresh conversation. Dormancy is never stored: it is
//! evaluated lazily when a message arrives.

mod policy;
mod types;

#[cfg(test)]
mod policy_props;

pub use policy::{THREADING_WINDOW_HOURS, ThreadingPolicy};
pub use types::{CandidateConversation, ConversationState, ThreadDecision, ThreadKey};
