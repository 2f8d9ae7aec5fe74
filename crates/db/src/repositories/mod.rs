//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod conversation;
pub mod inbox;
pub mod page;
pub mod token;
pub mod user;

pub use conversation::{AgentReply, ConversationRepository, IngestOutcome, ThreadingError};
pub use inbox::{ConversationSummary, InboxRepository};
pub use page::{LinkPageInput, PageError, PageRepository};
pub use token::TokenRepository;
pub use user::{UserError, UserRepository};
