//! Message storage; `seq` breaks ties between equal timestamps

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use chat_core::entities::Message;
use chat_core::error::DomainError;
use chat_core::traits::{MessageQuery, MessageRepository, RepoResult};
use chat_core::value_objects::{ConversationId, MessageId};

use crate::models::MessageModel;

use super::error::map_db_error;

const MESSAGE_COLUMNS: &str = "m.id, m.conversation_id, m.sender_id, m.content, m.kind, m.media_ref, \
     m.metadata, m.reply_to, m.thread_root, m.created_at, m.edited_at, m.deleted_at, m.is_system, \
     m.encryption_key_id";

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<Message>> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages m WHERE m.id = $1");
        let result = sqlx::query_as::<_, MessageModel>(&sql)
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.map(Message::from))
    }

    #[instrument(skip(self))]
    async fn find_by_conversation(
        &self,
        conversation_id: ConversationId,
        query: MessageQuery,
    ) -> RepoResult<Vec<Message>> {
        let limit = query.limit.clamp(1, 100);

        // Newest page first, then flipped to conversation order
        let mut results = match query.before {
            Some(before) => {
                let sql = format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages m \
                     JOIN messages anchor ON anchor.id = $2 \
                     WHERE m.conversation_id = $1 \
                       AND (m.created_at, m.seq) < (anchor.created_at, anchor.seq) \
                     ORDER BY m.created_at DESC, m.seq DESC LIMIT $3"
                );
                sqlx::query_as::<_, MessageModel>(&sql)
                    .bind(conversation_id.into_inner())
                    .bind(before.into_inner())
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let sql = format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages m \
                     WHERE m.conversation_id = $1 \
                     ORDER BY m.created_at DESC, m.seq DESC LIMIT $2"
                );
                sqlx::query_as::<_, MessageModel>(&sql)
                    .bind(conversation_id.into_inner())
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(map_db_error)?;

        results.reverse();
        Ok(results.into_iter().map(Message::from).collect())
    }

    #[instrument(skip(self, message), fields(message_id = %message.id))]
    async fn create(&self, message: &Message) -> RepoResult<DateTime<Utc>> {
        let created_at: DateTime<Utc> = sqlx::query_scalar(
            r#"
            INSERT INTO messages (
                id, conversation_id, sender_id, content, kind, media_ref, metadata,
                reply_to, thread_root, is_system, encryption_key_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING created_at
            "#,
        )
        .bind(message.id.into_inner())
        .bind(message.conversation_id.into_inner())
        .bind(message.sender_id.into_inner())
        .bind(&message.content)
        .bind(message.kind.as_str())
        .bind(&message.media_ref)
        .bind(&message.metadata)
        .bind(message.reply_to.map(MessageId::into_inner))
        .bind(message.thread_root.map(MessageId::into_inner))
        .bind(message.is_system)
        .bind(&message.encryption_key_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(created_at)
    }

    #[instrument(skip(self, message), fields(message_id = %message.id))]
    async fn update(&self, message: &Message) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET content = $2, edited_at = $3
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(message.id.into_inner())
        .bind(&message.content)
        .bind(message.edited_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::MessageNotFound(message.id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, id: MessageId, at: DateTime<Utc>) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET deleted_at = $2
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id.into_inner())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn latest(&self, conversation_id: ConversationId) -> RepoResult<Option<Message>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages m \
             WHERE m.conversation_id = $1 ORDER BY m.created_at DESC, m.seq DESC LIMIT 1"
        );
        let result = sqlx::query_as::<_, MessageModel>(&sql)
            .bind(conversation_id.into_inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.map(Message::from))
    }

    #[instrument(skip(self))]
    async fn count(&self, conversation_id: ConversationId) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
            .bind(conversation_id.into_inner())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(count)
    }
}
