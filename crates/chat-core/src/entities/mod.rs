//! Domain entities - core business objects

mod conversation;
mod message;
mod participant;
mod reaction;
mod read_receipt;

pub use conversation::{Conversation, ConversationKind, MAX_CONVERSATION_NAME_LENGTH};
pub use message::{Message, MessageKind, MAX_MESSAGE_LENGTH};
pub use participant::{Participant, ParticipantRole};
pub use reaction::Reaction;
pub use read_receipt::ReadReceipt;
