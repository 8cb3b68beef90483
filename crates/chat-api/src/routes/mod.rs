//! Route definitions
//!
//! Conversation endpoints live under /api/v1; health checks sit outside it.

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::handlers::{conversations, health, messages, reactions};
use crate::state::AppState;

/// API routes (health excluded so it can skip rate limiting)
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes())
}

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .merge(conversation_routes())
        .merge(message_routes())
}

fn conversation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations",
            post(conversations::create_conversation).get(conversations::list_conversations),
        )
        .route("/conversations/direct", get(conversations::find_direct_conversation))
        .route("/conversations/:conversation_id", get(conversations::get_conversation))
        .route(
            "/conversations/:conversation_id/participants",
            post(conversations::add_participant),
        )
        .route(
            "/conversations/:conversation_id/participants/@me",
            delete(conversations::leave_conversation),
        )
        .route(
            "/conversations/:conversation_id/archive",
            post(conversations::archive_conversation),
        )
}

fn message_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations/:conversation_id/messages",
            get(messages::list_messages).post(messages::append_message),
        )
        .route(
            "/conversations/:conversation_id/messages/:message_id",
            patch(messages::edit_message).delete(messages::delete_message),
        )
        .route("/conversations/:conversation_id/read", post(messages::mark_read))
        .route(
            "/conversations/:conversation_id/messages/:message_id/reactions",
            post(reactions::add_reaction).get(reactions::list_reactions),
        )
}
