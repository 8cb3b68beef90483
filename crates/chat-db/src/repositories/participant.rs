//! PostgreSQL implementation of ParticipantRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use chat_core::entities::Participant;
use chat_core::error::DomainError;
use chat_core::traits::{ParticipantRepository, RepoResult};
use chat_core::value_objects::{ConversationId, UserId};

use crate::models::ParticipantModel;

use super::error::{map_db_error, map_unique_violation};

/// PostgreSQL implementation of ParticipantRepository
#[derive(Clone)]
pub struct PgParticipantRepository {
    pool: PgPool,
}

impl PgParticipantRepository {
    /// Create a new PgParticipantRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ParticipantRepository for PgParticipantRepository {
    #[instrument(skip(self))]
    async fn find(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> RepoResult<Option<Participant>> {
        let result = sqlx::query_as::<_, ParticipantModel>(
            r#"
            SELECT conversation_id, user_id, role, joined_at, left_at,
                   last_read_at, muted, unread_count
            FROM conversation_participants
            WHERE conversation_id = $1 AND user_id = $2
            "#,
        )
        .bind(conversation_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Participant::from))
    }

    #[instrument(skip(self))]
    async fn find_active(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> RepoResult<Option<Participant>> {
        let result = sqlx::query_as::<_, ParticipantModel>(
            r#"
            SELECT conversation_id, user_id, role, joined_at, left_at,
                   last_read_at, muted, unread_count
            FROM conversation_participants
            WHERE conversation_id = $1 AND user_id = $2 AND left_at IS NULL
            "#,
        )
        .bind(conversation_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Participant::from))
    }

    #[instrument(skip(self))]
    async fn list_active(&self, conversation_id: ConversationId) -> RepoResult<Vec<Participant>> {
        let results = sqlx::query_as::<_, ParticipantModel>(
            r#"
            SELECT conversation_id, user_id, role, joined_at, left_at,
                   last_read_at, muted, unread_count
            FROM conversation_participants
            WHERE conversation_id = $1 AND left_at IS NULL
            ORDER BY joined_at, user_id
            "#,
        )
        .bind(conversation_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Participant::from).collect())
    }

    #[instrument(skip(self, participant), fields(conversation_id = %participant.conversation_id, user_id = %participant.user_id))]
    async fn insert(&self, participant: &Participant) -> RepoResult<()> {
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
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::AlreadyParticipant))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn reactivate(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE conversation_participants
            SET left_at = NULL, joined_at = $3, unread_count = 0
            WHERE conversation_id = $1 AND user_id = $2 AND left_at IS NOT NULL
            "#,
        )
        .bind(conversation_id.into_inner())
        .bind(user_id.into_inner())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn mark_left(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE conversation_participants
            SET left_at = $3
            WHERE conversation_id = $1 AND user_id = $2 AND left_at IS NULL
            "#,
        )
        .bind(conversation_id.into_inner())
        .bind(user_id.into_inner())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn increment_unread(
        &self,
        conversation_id: ConversationId,
        except: UserId,
    ) -> RepoResult<()> {
        sqlx::query(
            r#"
            UPDATE conversation_participants
            SET unread_count = unread_count + 1
            WHERE conversation_id = $1 AND user_id <> $2 AND left_at IS NULL
            "#,
        )
        .bind(conversation_id.into_inner())
        .bind(except.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_read(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> RepoResult<()> {
        sqlx::query(
            r#"
            UPDATE conversation_participants
            SET last_read_at = GREATEST(COALESCE(last_read_at, $3), $3), unread_count = 0
            WHERE conversation_id = $1 AND user_id = $2
            "#,
        )
        .bind(conversation_id.into_inner())
        .bind(user_id.into_inner())
        .bind(at)
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
        assert_send_sync::<PgParticipantRepository>();
    }
}
