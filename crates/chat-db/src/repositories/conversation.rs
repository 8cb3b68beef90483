//! PostgreSQL implementation of ConversationRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use chat_core::entities::{Conversation, ConversationKind, Participant};
use chat_core::error::DomainError;
use chat_core::traits::{ConversationFilter, ConversationRepository, RepoResult};
use chat_core::value_objects::{ConversationId, ParticipantKey, UserId};

use crate::models::ConversationModel;

use super::error::{map_db_error, map_unique_violation};

const CONVERSATION_COLUMNS: &str = "c.id, c.kind, c.name, c.posting_ref, c.created_by, c.archived, \
     c.participant_key, c.participant_count, c.last_activity_at, c.created_at";

/// PostgreSQL implementation of ConversationRepository
#[derive(Clone)]
pub struct PgConversationRepository {
    pool: PgPool,
}

impl PgConversationRepository {
    /// Create a new PgConversationRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationRepository for PgConversationRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: ConversationId) -> RepoResult<Option<Conversation>> {
        let sql = format!("SELECT {CONVERSATION_COLUMNS} FROM conversations c WHERE c.id = $1");
        let result = sqlx::query_as::<_, ConversationModel>(&sql)
            .bind(id.into_inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.map(Conversation::from))
    }

    #[instrument(skip(self))]
    async fn find_active_group(&self, posting_ref: &str) -> RepoResult<Option<Conversation>> {
        let sql = format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations c \
             WHERE c.posting_ref = $1 AND c.kind = 'GROUP' AND NOT c.archived"
        );
        let result = sqlx::query_as::<_, ConversationModel>(&sql)
            .bind(posting_ref)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.map(Conversation::from))
    }

    #[instrument(skip(self))]
    async fn find_active_pairwise(
        &self,
        posting_ref: &str,
        kind: ConversationKind,
        key: &ParticipantKey,
    ) -> RepoResult<Option<Conversation>> {
        let sql = format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations c \
             WHERE c.posting_ref = $1 AND c.kind = $2 AND c.participant_key = $3 AND NOT c.archived"
        );
        let result = sqlx::query_as::<_, ConversationModel>(&sql)
            .bind(posting_ref)
            .bind(kind.as_str())
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.map(Conversation::from))
    }

    #[instrument(skip(self, conversation, participants), fields(conversation_id = %conversation.id))]
    async fn create(
        &self,
        conversation: &Conversation,
        participants: &[Participant],
    ) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            r#"
            INSERT INTO conversations (
                id, kind, name, posting_ref, created_by, archived,
                participant_key, participant_count, last_activity_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(conversation.id.into_inner())
        .bind(conversation.kind.as_str())
        .bind(&conversation.name)
        .bind(&conversation.posting_ref)
        .bind(conversation.created_by.into_inner())
        .bind(conversation.archived)
        .bind(conversation.participant_key.as_ref().map(ParticipantKey::as_str))
        .bind(conversation.participant_count)
        .bind(conversation.last_activity_at)
        .bind(conversation.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::DuplicateConversation))?;

        for participant in participants {
            sqlx::query(
                r#"
                INSERT INTO conversation_participants (
                    conversation_id, user_id, role, joined_at, left_at,
                    last_read_at, muted, unread_count
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(participant.conversation_id.into_inner())
            .bind(participant.user_id.into_inner())
            .bind(participant.role.as_str())
            .bind(participant.joined_at)
            .bind(participant.left_at)
            .bind(participant.last_read_at)
            .bind(participant.muted)
            .bind(participant.unread_count)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_user(
        &self,
        user_id: UserId,
        filter: &ConversationFilter,
    ) -> RepoResult<Vec<Conversation>> {
        let limit = filter.limit.clamp(1, 100);
        let sql = format!(
            r#"
            SELECT {CONVERSATION_COLUMNS}
            FROM conversations c
            INNER JOIN conversation_participants p ON p.conversation_id = c.id
            WHERE p.user_id = $1
              AND p.left_at IS NULL
              AND ($2 OR NOT c.archived)
              AND ($3::TEXT IS NULL OR c.kind = $3)
              AND ($4::TEXT IS NULL OR c.posting_ref = $4)
            ORDER BY c.last_activity_at DESC, c.id
            LIMIT $5
            "#
        );

        let results = sqlx::query_as::<_, ConversationModel>(&sql)
            .bind(user_id.into_inner())
            .bind(filter.include_archived)
            .bind(filter.kind.map(ConversationKind::as_str))
            .bind(filter.posting_ref.as_deref())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(results.into_iter().map(Conversation::from).collect())
    }

    #[instrument(skip(self))]
    async fn touch(&self, id: ConversationId, at: DateTime<Utc>) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET last_activity_at = GREATEST(last_activity_at, $2)
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ConversationNotFound(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_archived(&self, id: ConversationId, archived: bool) -> RepoResult<()> {
        let result = sqlx::query("UPDATE conversations SET archived = $2 WHERE id = $1")
            .bind(id.into_inner())
            .bind(archived)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, || DomainError::DuplicateConversation))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ConversationNotFound(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn adjust_participant_count(&self, id: ConversationId, delta: i32) -> RepoResult<()> {
        sqlx::query(
            r#"
            UPDATE conversations
            SET participant_count = GREATEST(participant_count + $2, 0)
            WHERE id = $1
            "#,
        )
        .bind(id.into_inner())
        .bind(delta)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgConversationRepository>();
    }
}
