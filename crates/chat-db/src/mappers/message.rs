//! Message, reaction and receipt model -> entity mappers

use chat_core::entities::{Message, MessageKind, Reaction, ReadReceipt};
use chat_core::value_objects::{ConversationId, MessageId, UserId};

use crate::models::{MessageModel, ReactionModel, ReadReceiptModel};

/// Convert MessageModel to Message entity
impl From<MessageModel> for Message {
    fn from(model: MessageModel) -> Self {
        Message {
            id: MessageId::from_uuid(model.id),
            conversation_id: ConversationId::from_uuid(model.conversation_id),
            sender_id: UserId::from_uuid(model.sender_id),
            content: model.content,
            kind: MessageKind::parse(&model.kind).unwrap_or_default(),
            media_ref: model.media_ref,
            metadata: model.metadata,
            reply_to: model.reply_to.map(MessageId::from_uuid),
            thread_root: model.thread_root.map(MessageId::from_uuid),
            created_at: model.created_at,
            edited_at: model.edited_at,
            deleted_at: model.deleted_at,
            is_system: model.is_system,
            encryption_key_id: model.encryption_key_id,
        }
    }
}

impl From<ReactionModel> for Reaction {
    fn from(model: ReactionModel) -> Self {
        Reaction {
            message_id: MessageId::from_uuid(model.message_id),
            user_id: UserId::from_uuid(model.user_id),
            emoji: model.emoji,
            created_at: model.created_at,
        }
    }
}

impl From<ReadReceiptModel> for ReadReceipt {
    fn from(model: ReadReceiptModel) -> Self {
        ReadReceipt {
            message_id: MessageId::from_uuid(model.message_id),
            user_id: UserId::from_uuid(model.user_id),
            read_at: model.read_at,
        }
    }
}
