//! Conversation handlers

use axum::{
    extract::{Path, State},
    Json,
};
use chat_service::dto::{
    AddParticipantRequest, ConversationResponse, ConversationSummaryResponse, CreateConversationRequest,
    DirectConversationQuery, ListConversationsQuery, ParticipantResponse,
};
use chat_service::ConversationService;

use crate::extractors::{AuthUser, ConversationPath, JsonBody, ValidatedJson, ValidatedQuery};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// Create or reuse a conversation
///
/// POST /conversations
///
/// A request matching a live conversation returns that conversation.
pub async fn create_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateConversationRequest>,
) -> ApiResult<Created<Json<ConversationResponse>>> {
    let service = ConversationService::new(state.service_context());
    let response = service.create_conversation(auth.user_id, request).await?;
    Ok(Created(Json(response)))
}

/// Conversations the caller participates in, most recent activity first
///
/// GET /conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<ListConversationsQuery>,
) -> ApiResult<Json<Vec<ConversationSummaryResponse>>> {
    let service = ConversationService::new(state.service_context());
    let conversations = service
        .get_conversations_for_user(auth.user_id, query.into())
        .await?;
    Ok(Json(conversations))
}

/// Live 1:1 thread with another user about a posting, if there is one
///
/// GET /conversations/direct?posting_ref=&user_id=
pub async fn find_direct_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedQuery(query): ValidatedQuery<DirectConversationQuery>,
) -> ApiResult<Json<ConversationResponse>> {
    let service = ConversationService::new(state.service_context());
    let response = service
        .get_direct_conversation(auth.user_id, &query.posting_ref, query.user_id)
        .await?;
    Ok(Json(response))
}

/// GET /conversations/{conversation_id}
pub async fn get_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<ConversationPath>,
) -> ApiResult<Json<ConversationResponse>> {
    let service = ConversationService::new(state.service_context());
    let response = service
        .get_conversation(path.conversation_id()?, auth.user_id)
        .await?;
    Ok(Json(response))
}

/// Add a participant, or join a group-like conversation yourself
///
/// POST /conversations/{conversation_id}/participants
pub async fn add_participant(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<ConversationPath>,
    JsonBody(request): JsonBody<AddParticipantRequest>,
) -> ApiResult<Created<Json<ParticipantResponse>>> {
    let service = ConversationService::new(state.service_context());
    let participant = service
        .add_participant(auth.user_id, path.conversation_id()?, request.user_id)
        .await?;
    Ok(Created(Json(participant)))
}

/// DELETE /conversations/{conversation_id}/participants/@me
pub async fn leave_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<ConversationPath>,
) -> ApiResult<NoContent> {
    let service = ConversationService::new(state.service_context());
    service
        .leave_conversation(auth.user_id, path.conversation_id()?)
        .await?;
    Ok(NoContent)
}

/// POST /conversations/{conversation_id}/archive
pub async fn archive_conversation(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<ConversationPath>,
) -> ApiResult<NoContent> {
    let service = ConversationService::new(state.service_context());
    service
        .archive_conversation(auth.user_id, path.conversation_id()?)
        .await?;
    Ok(NoContent)
}
