//! Repository and collaborator traits

mod collaborators;
mod repositories;

pub use collaborators::{EventPublisher, PostingDirectory};
pub use repositories::{
    ConversationFilter, ConversationRepository, MessageQuery, MessageRepository,
    ParticipantRepository, ReactionRepository, ReadReceiptRepository, RepoResult,
};
