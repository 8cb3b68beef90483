//! Request and response shapes shared by the REST handlers and the gateway

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::{
    AddParticipantRequest, AddReactionRequest, CreateConversationRequest, CreateMessageRequest,
    DirectConversationQuery, ListConversationsQuery, ListMessagesQuery, MarkReadRequest, UpdateMessageRequest,
};

pub use responses::{
    ConversationResponse, ConversationSummaryResponse, LastMessagePreview, MessageResponse,
    ParticipantResponse, ReactionResponse, ReadStateResponse,
};

pub use mappers::PREVIEW_LENGTH;
