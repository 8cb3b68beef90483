//! Reaction handlers

use axum::{
    extract::{Path, State},
    Json,
};
use chat_service::dto::{AddReactionRequest, ReactionResponse};
use chat_service::MessageService;

use crate::extractors::{AuthUser, MessagePath, ValidatedJson};
use crate::response::{ApiResult, Created};
use crate::state::AppState;

/// POST /conversations/{conversation_id}/messages/{message_id}/reactions
pub async fn add_reaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<MessagePath>,
    ValidatedJson(request): ValidatedJson<AddReactionRequest>,
) -> ApiResult<Created<Json<ReactionResponse>>> {
    let (conversation_id, message_id) = path.ids()?;

    let service = MessageService::new(state.service_context());
    let reaction = service
        .add_reaction(conversation_id, message_id, auth.user_id, request)
        .await?;
    Ok(Created(Json(reaction)))
}

/// GET /conversations/{conversation_id}/messages/{message_id}/reactions
pub async fn list_reactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<MessagePath>,
) -> ApiResult<Json<Vec<ReactionResponse>>> {
    let (conversation_id, message_id) = path.ids()?;

    let service = MessageService::new(state.service_context());
    let reactions = service
        .get_reactions(conversation_id, message_id, auth.user_id)
        .await?;
    Ok(Json(reactions))
}
