//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in chat-core.
//! Each repository handles database operations for a specific domain entity.

mod conversation;
mod error;
mod message;
mod participant;
mod posting;
mod reaction;

pub use conversation::PgConversationRepository;
pub use message::PgMessageRepository;
pub use participant::PgParticipantRepository;
pub use posting::PgPostingDirectory;
pub use reaction::{PgReactionRepository, PgReadReceiptRepository};
