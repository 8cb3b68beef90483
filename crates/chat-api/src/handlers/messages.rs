//! Message handlers

use axum::{
    extract::{Path, State},
    Json,
};
use chat_service::dto::{CreateMessageRequest, MarkReadRequest, MessageResponse, ReadStateResponse, UpdateMessageRequest};
use chat_service::MessageService;

use crate::extractors::{AuthUser, ConversationPath, JsonBody, MessagePath, OptionalJson, Pagination, ValidatedJson};
use crate::response::{ApiResult, Created, NoContent};
use crate::state::AppState;

/// Message history, newest page first
///
/// GET /conversations/{conversation_id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<ConversationPath>,
    Pagination(page): Pagination,
) -> ApiResult<Json<Vec<MessageResponse>>> {
    let service = MessageService::new(state.service_context());
    let messages = service
        .list_messages(path.conversation_id()?, auth.user_id, page)
        .await?;
    Ok(Json(messages))
}

/// Persist a message and fan it out to the room
///
/// POST /conversations/{conversation_id}/messages
pub async fn append_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<ConversationPath>,
    JsonBody(request): JsonBody<CreateMessageRequest>,
) -> ApiResult<Created<Json<MessageResponse>>> {
    let service = MessageService::new(state.service_context());
    let response = service
        .append_message(path.conversation_id()?, auth.user_id, request)
        .await?;
    Ok(Created(Json(response)))
}

/// PATCH /conversations/{conversation_id}/messages/{message_id}
pub async fn edit_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<MessagePath>,
    ValidatedJson(request): ValidatedJson<UpdateMessageRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let (conversation_id, message_id) = path.ids()?;

    let service = MessageService::new(state.service_context());
    let response = service
        .edit_message(conversation_id, message_id, auth.user_id, request)
        .await?;
    Ok(Json(response))
}

/// DELETE /conversations/{conversation_id}/messages/{message_id}
pub async fn delete_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<MessagePath>,
) -> ApiResult<NoContent> {
    let (conversation_id, message_id) = path.ids()?;

    let service = MessageService::new(state.service_context());
    service
        .delete_message(conversation_id, message_id, auth.user_id)
        .await?;
    Ok(NoContent)
}

/// Reset the caller's unread count
///
/// POST /conversations/{conversation_id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<ConversationPath>,
    OptionalJson(request): OptionalJson<MarkReadRequest>,
) -> ApiResult<Json<ReadStateResponse>> {
    let service = MessageService::new(state.service_context());
    let response = service
        .mark_read(path.conversation_id()?, auth.user_id, request)
        .await?;
    Ok(Json(response))
}
