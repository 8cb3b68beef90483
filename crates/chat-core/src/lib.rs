//! # chat-core
//!
//! Domain layer containing entities, value objects, repository traits, and domain events.
//! This crate has zero dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Conversation, ConversationKind, Message, MessageKind, Participant, ParticipantRole, Reaction,
    ReadReceipt,
};
pub use error::{DomainError, DomainErrorKind};
pub use events::ConversationEvent;
pub use traits::{
    ConversationFilter, ConversationRepository, EventPublisher, MessageQuery, MessageRepository,
    ParticipantRepository, PostingDirectory, ReactionRepository, ReadReceiptRepository,
    RepoResult,
};
pub use value_objects::{ConversationId, IdParseError, MessageId, ParticipantKey, UserId};
