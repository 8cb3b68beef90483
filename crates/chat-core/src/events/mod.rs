//! Domain events

mod conversation_event;

pub use conversation_event::{
    ConversationEvent, MessageDeletedEvent, MessageNewEvent, MessageUpdatedEvent,
    ParticipantJoinedEvent, ParticipantLeftEvent, ReactionAddedEvent, ReadUpdatedEvent,
};
