//! Value objects - immutable types that represent domain concepts

mod ids;
mod participant_key;

pub use ids::{ConversationId, IdParseError, MessageId, UserId};
pub use participant_key::ParticipantKey;
