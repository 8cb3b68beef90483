//! Message service
//!
//! Handles message append, history, edits, soft deletes, read state and reactions.

use chat_core::entities::{Conversation, Message, Reaction, ReadReceipt};
use chat_core::events::{
    MessageDeletedEvent, MessageNewEvent, MessageUpdatedEvent, ReactionAddedEvent,
    ReadUpdatedEvent,
};
use chat_core::traits::MessageQuery;
use chat_core::{ConversationEvent, ConversationId, DomainError, MessageId, UserId};
use chrono::Utc;
use tracing::{debug, info, instrument};
use validator::Validate;

use crate::dto::{
    AddReactionRequest, CreateMessageRequest, ListMessagesQuery, MarkReadRequest,
    MessageResponse, ReactionResponse, ReadStateResponse, UpdateMessageRequest,
};

use super::context::ServiceContext;
use super::conversation::ConversationService;
use super::error::{ServiceError, ServiceResult};

const DEFAULT_PAGE: i64 = 50;

/// Message service
pub struct MessageService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MessageService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Persist a message from an active participant and announce it.
    ///
    /// The stored record (id, timestamp) is what subscribers receive.
    #[instrument(skip(self, request))]
    pub async fn append_message(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        request: CreateMessageRequest,
    ) -> ServiceResult<MessageResponse> {
        request.check_content()?;
        request.validate()?;

        let (conversation, _) = self.require_member(conversation_id, sender_id).await?;
        if conversation.archived {
            return Err(DomainError::ConversationArchived.into());
        }

        if let Some(reply_to) = request.reply_to {
            let parent = self.ctx.message_repo().find_by_id(reply_to).await?;
            if parent.map_or(true, |m| m.conversation_id != conversation_id) {
                return Err(ServiceError::validation(
                    "Replied-to message must be in the same conversation",
                ));
            }
        }

        let mut message = Message::new(conversation_id, sender_id, request.content, request.kind);
        message.reply_to = request.reply_to;
        message.media_ref = request.media_ref;
        message.metadata = request.metadata;

        message.created_at = self.ctx.message_repo().create(&message).await?;
        self.ctx
            .conversation_repo()
            .touch(conversation_id, message.created_at)
            .await?;
        self.ctx
            .participant_repo()
            .increment_unread(conversation_id, sender_id)
            .await?;

        info!(
            message_id = %message.id,
            conversation_id = %conversation_id,
            sender_id = %sender_id,
            "Message appended"
        );

        let response = MessageResponse::from(&message);
        self.ctx
            .publish(ConversationEvent::MessageNew(MessageNewEvent {
                conversation_id,
                message,
            }))
            .await;

        Ok(response)
    }

    /// History page, oldest first; deleted messages keep their place
    #[instrument(skip(self, query))]
    pub async fn list_messages(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        query: ListMessagesQuery,
    ) -> ServiceResult<Vec<MessageResponse>> {
        query.validate()?;
        self.require_member(conversation_id, user_id).await?;

        let messages = self
            .ctx
            .message_repo()
            .find_by_conversation(
                conversation_id,
                MessageQuery {
                    before: query.before,
                    limit: query.limit.unwrap_or(DEFAULT_PAGE),
                },
            )
            .await?;

        Ok(messages.iter().map(MessageResponse::from).collect())
    }

    /// Edit a message; only its sender may
    #[instrument(skip(self, request))]
    pub async fn edit_message(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
        user_id: UserId,
        request: UpdateMessageRequest,
    ) -> ServiceResult<MessageResponse> {
        request.validate()?;
        self.require_member(conversation_id, user_id).await?;

        let mut message = self.find_in(conversation_id, message_id).await?;
        if message.sender_id != user_id {
            return Err(DomainError::NotMessageSender.into());
        }
        if message.is_deleted() {
            return Err(DomainError::MessageDeleted.into());
        }

        message.edit(request.content.trim().to_string());
        self.ctx.message_repo().update(&message).await?;

        info!(message_id = %message_id, "Message edited");

        let edited_at = message.edited_at.unwrap_or_else(Utc::now);
        self.ctx
            .publish(ConversationEvent::MessageUpdated(MessageUpdatedEvent {
                conversation_id,
                message_id,
                sender_id: user_id,
                content: message.content.clone(),
                edited_at,
            }))
            .await;

        Ok(MessageResponse::from(message))
    }

    /// Soft-delete a message; only its sender may. Deleting twice is a no-op.
    #[instrument(skip(self))]
    pub async fn delete_message(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
        user_id: UserId,
    ) -> ServiceResult<()> {
        self.require_member(conversation_id, user_id).await?;

        let message = self.find_in(conversation_id, message_id).await?;
        if message.sender_id != user_id {
            return Err(DomainError::NotMessageSender.into());
        }

        let now = Utc::now();
        if !self.ctx.message_repo().soft_delete(message_id, now).await? {
            debug!(message_id = %message_id, "Message already deleted");
            return Ok(());
        }

        info!(message_id = %message_id, "Message deleted");

        self.ctx
            .publish(ConversationEvent::MessageDeleted(MessageDeletedEvent {
                conversation_id,
                message_id,
                sender_id: user_id,
                deleted_at: now,
            }))
            .await;

        Ok(())
    }

    /// Advance the caller's read position and zero their unread count
    #[instrument(skip(self, request))]
    pub async fn mark_read(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        request: MarkReadRequest,
    ) -> ServiceResult<ReadStateResponse> {
        let (_, participant) = self.require_member(conversation_id, user_id).await?;

        if let Some(message_id) = request.up_to_message_id {
            self.find_in(conversation_id, message_id).await?;
        }

        let now = Utc::now();
        self.ctx
            .participant_repo()
            .mark_read(conversation_id, user_id, now)
            .await?;

        let new_receipt = match request.up_to_message_id {
            Some(message_id) => {
                self.ctx
                    .receipt_repo()
                    .record(&ReadReceipt::new(message_id, user_id))
                    .await?
            }
            None => false,
        };

        // Repeating the same read changes nothing observable
        if participant.unread_count > 0 || new_receipt {
            self.ctx
                .publish(ConversationEvent::ReadUpdated(ReadUpdatedEvent {
                    conversation_id,
                    user_id,
                    up_to_message_id: request.up_to_message_id,
                    read_at: now,
                }))
                .await;
        }

        Ok(ReadStateResponse {
            conversation_id,
            user_id,
            up_to_message_id: request.up_to_message_id,
            last_read_at: now,
            unread_count: 0,
        })
    }

    #[instrument(skip(self, request))]
    pub async fn add_reaction(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
        user_id: UserId,
        request: AddReactionRequest,
    ) -> ServiceResult<ReactionResponse> {
        request.validate()?;
        self.require_member(conversation_id, user_id).await?;

        let message = self.find_in(conversation_id, message_id).await?;
        if message.is_deleted() {
            return Err(DomainError::MessageDeleted.into());
        }

        let reaction = Reaction::new(message_id, user_id, request.emoji.trim().to_string());
        self.ctx.reaction_repo().create(&reaction).await?;

        self.ctx
            .publish(ConversationEvent::ReactionAdded(ReactionAddedEvent {
                conversation_id,
                message_id,
                user_id,
                emoji: reaction.emoji.clone(),
                timestamp: reaction.created_at,
            }))
            .await;

        Ok(ReactionResponse::from(reaction))
    }

    pub async fn get_reactions(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
        user_id: UserId,
    ) -> ServiceResult<Vec<ReactionResponse>> {
        self.require_member(conversation_id, user_id).await?;
        self.find_in(conversation_id, message_id).await?;

        let reactions = self.ctx.reaction_repo().find_by_message(message_id).await?;
        Ok(reactions.into_iter().map(ReactionResponse::from).collect())
    }

    async fn require_member(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> ServiceResult<(Conversation, chat_core::Participant)> {
        ConversationService::new(self.ctx)
            .require_member(conversation_id, user_id)
            .await
    }

    /// Message by id, scoped to a conversation
    async fn find_in(
        &self,
        conversation_id: ConversationId,
        message_id: MessageId,
    ) -> ServiceResult<Message> {
        self.ctx
            .message_repo()
            .find_by_id(message_id)
            .await?
            .filter(|m| m.conversation_id == conversation_id)
            .ok_or_else(|| DomainError::MessageNotFound(message_id).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::CreateConversationRequest;
    use crate::testing::{test_context, TestHarness};
    use chat_core::MessageKind;

    struct Pair {
        h: TestHarness,
        conversation_id: ConversationId,
        a: UserId,
        b: UserId,
    }

    async fn pair() -> Pair {
        let h = test_context();
        let (a, b) = (UserId::new(), UserId::new());
        let conv = ConversationService::new(&h.ctx)
            .create_conversation(a, CreateConversationRequest::direct(b, None))
            .await
            .unwrap();
        h.events.clear();
        Pair {
            h,
            conversation_id: conv.id,
            a,
            b,
        }
    }

    async fn send(p: &Pair, from: UserId, text: &str) -> MessageResponse {
        MessageService::new(&p.h.ctx)
            .append_message(p.conversation_id, from, CreateMessageRequest::text(text))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_messages_listed_in_send_order() {
        let p = pair().await;
        let sent = [
            send(&p, p.a, "one").await,
            send(&p, p.b, "two").await,
            send(&p, p.a, "three").await,
        ];

        let history = MessageService::new(&p.h.ctx)
            .list_messages(p.conversation_id, p.b, ListMessagesQuery::default())
            .await
            .unwrap();

        let ids: Vec<_> = history.iter().map(|m| m.id).collect();
        assert_eq!(ids, sent.iter().map(|m| m.id).collect::<Vec<_>>());
        assert_eq!(p.h.events.names(), vec!["message:new"; 3]);
    }

    #[tokio::test]
    async fn test_store_assigns_timestamps_in_arrival_order() {
        use chat_core::traits::MessageRepository;

        let p = pair().await;
        // A writer whose clock runs an hour ahead
        let mut early = Message::new(p.conversation_id, p.b, "from the fast clock".to_string(), MessageKind::Text);
        early.created_at = Utc::now() + chrono::Duration::hours(1);
        let stamped = p.h.store.create(&early).await.unwrap();
        assert!(stamped < early.created_at);

        let later = send(&p, p.a, "second").await;
        assert!(later.created_at >= stamped);

        let history = MessageService::new(&p.h.ctx)
            .list_messages(p.conversation_id, p.a, ListMessagesQuery::default())
            .await
            .unwrap();
        let ids: Vec<_> = history.iter().map(|m| m.id).collect();
        assert_eq!(ids, [early.id, later.id]);
    }

    #[tokio::test]
    async fn test_soft_delete_preserves_order() {
        let p = pair().await;
        let service = MessageService::new(&p.h.ctx);
        let first = send(&p, p.a, "first").await;
        let middle = send(&p, p.a, "oops").await;
        let last = send(&p, p.b, "last").await;

        service
            .delete_message(p.conversation_id, middle.id, p.a)
            .await
            .unwrap();

        let history = service
            .list_messages(p.conversation_id, p.a, ListMessagesQuery::default())
            .await
            .unwrap();
        assert_eq!(
            history.iter().map(|m| m.id).collect::<Vec<_>>(),
            vec![first.id, middle.id, last.id]
        );
        assert!(history[1].content.is_none());
        assert!(history[1].deleted_at.is_some());
        assert_eq!(history[0].content.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_history_paging_with_cursor() {
        let p = pair().await;
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(send(&p, p.a, &format!("m{i}")).await.id);
        }
        let service = MessageService::new(&p.h.ctx);

        let latest = service
            .list_messages(
                p.conversation_id,
                p.b,
                ListMessagesQuery {
                    before: None,
                    limit: Some(2),
                },
            )
            .await
            .unwrap();
        assert_eq!(latest.iter().map(|m| m.id).collect::<Vec<_>>(), ids[3..]);

        let earlier = service
            .list_messages(
                p.conversation_id,
                p.b,
                ListMessagesQuery {
                    before: Some(ids[3]),
                    limit: Some(2),
                },
            )
            .await
            .unwrap();
        assert_eq!(earlier.iter().map(|m| m.id).collect::<Vec<_>>(), ids[1..3]);
    }

    #[tokio::test]
    async fn test_non_member_cannot_send_or_read() {
        let p = pair().await;
        let outsider = UserId::new();
        let service = MessageService::new(&p.h.ctx);

        let err = service
            .append_message(p.conversation_id, outsider, CreateMessageRequest::text("hi"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = service
            .list_messages(p.conversation_id, outsider, ListMessagesQuery::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(p.h.events.events().is_empty());
    }

    #[tokio::test]
    async fn test_content_rules() {
        let p = pair().await;
        let service = MessageService::new(&p.h.ctx);

        let err = service
            .append_message(p.conversation_id, p.a, CreateMessageRequest::text("   "))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err = service
            .append_message(p.conversation_id, p.a, CreateMessageRequest::text("x".repeat(4001)))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "CONTENT_TOO_LONG");

        let system = CreateMessageRequest {
            kind: MessageKind::System,
            ..CreateMessageRequest::text("spoof")
        };
        let err = service
            .append_message(p.conversation_id, p.a, system)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_reply_must_stay_in_conversation() {
        let p = pair().await;
        let other = pair().await;
        let foreign = send(&other, other.a, "elsewhere").await;

        let reply = CreateMessageRequest {
            reply_to: Some(foreign.id),
            ..CreateMessageRequest::text("re")
        };
        let err = MessageService::new(&p.h.ctx)
            .append_message(p.conversation_id, p.a, reply)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_only_sender_edits_or_deletes() {
        let p = pair().await;
        let service = MessageService::new(&p.h.ctx);
        let msg = send(&p, p.a, "draft").await;

        let err = service
            .edit_message(
                p.conversation_id,
                msg.id,
                p.b,
                UpdateMessageRequest {
                    content: "hijack".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_MESSAGE_SENDER");
        let err = service
            .delete_message(p.conversation_id, msg.id, p.b)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_MESSAGE_SENDER");

        let edited = service
            .edit_message(
                p.conversation_id,
                msg.id,
                p.a,
                UpdateMessageRequest {
                    content: "final".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.content.as_deref(), Some("final"));
        assert!(edited.edited_at.is_some());
    }

    #[tokio::test]
    async fn test_deleted_message_rejects_edit_and_reaction() {
        let p = pair().await;
        let service = MessageService::new(&p.h.ctx);
        let msg = send(&p, p.a, "gone").await;

        service.delete_message(p.conversation_id, msg.id, p.a).await.unwrap();
        // Second delete is a no-op without a second event
        service.delete_message(p.conversation_id, msg.id, p.a).await.unwrap();

        let err = service
            .edit_message(
                p.conversation_id,
                msg.id,
                p.a,
                UpdateMessageRequest {
                    content: "back".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "MESSAGE_DELETED");

        let err = service
            .add_reaction(
                p.conversation_id,
                msg.id,
                p.b,
                AddReactionRequest {
                    emoji: "👍".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "MESSAGE_DELETED");

        assert_eq!(p.h.events.names(), vec!["message:new", "message:deleted"]);
    }

    #[tokio::test]
    async fn test_duplicate_reaction_conflicts() {
        let p = pair().await;
        let service = MessageService::new(&p.h.ctx);
        let msg = send(&p, p.a, "nice").await;
        let thumbs = || AddReactionRequest {
            emoji: "👍".to_string(),
        };

        service
            .add_reaction(p.conversation_id, msg.id, p.b, thumbs())
            .await
            .unwrap();
        let err = service
            .add_reaction(p.conversation_id, msg.id, p.b, thumbs())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "REACTION_ALREADY_EXISTS");
        assert_eq!(err.status_code(), 409);

        service
            .add_reaction(p.conversation_id, msg.id, p.a, thumbs())
            .await
            .unwrap();
        let reactions = service
            .get_reactions(p.conversation_id, msg.id, p.a)
            .await
            .unwrap();
        assert_eq!(reactions.len(), 2);
    }

    #[tokio::test]
    async fn test_unread_counts_and_idempotent_read() {
        let p = pair().await;
        let service = MessageService::new(&p.h.ctx);
        send(&p, p.a, "one").await;
        let last = send(&p, p.a, "two").await;

        let summaries = ConversationService::new(&p.h.ctx)
            .get_conversations_for_user(p.b, Default::default())
            .await
            .unwrap();
        assert_eq!(summaries[0].unread_count, 2);
        p.h.events.clear();

        let read = MarkReadRequest {
            up_to_message_id: Some(last.id),
        };
        let state = service
            .mark_read(p.conversation_id, p.b, read.clone())
            .await
            .unwrap();
        assert_eq!(state.unread_count, 0);
        service
            .mark_read(p.conversation_id, p.b, read)
            .await
            .unwrap();

        assert_eq!(p.h.events.names(), vec!["read:updated"]);
        let summaries = ConversationService::new(&p.h.ctx)
            .get_conversations_for_user(p.b, Default::default())
            .await
            .unwrap();
        assert_eq!(summaries[0].unread_count, 0);
    }

    #[tokio::test]
    async fn test_archived_conversation_rejects_messages() {
        let p = pair().await;
        ConversationService::new(&p.h.ctx)
            .archive_conversation(p.a, p.conversation_id)
            .await
            .unwrap();

        let err = MessageService::new(&p.h.ctx)
            .append_message(p.conversation_id, p.b, CreateMessageRequest::text("late"))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "CONVERSATION_ARCHIVED");
    }
}
