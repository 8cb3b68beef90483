//! PostgreSQL implementations of ReactionRepository and ReadReceiptRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use chat_core::entities::{Reaction, ReadReceipt};
use chat_core::error::DomainError;
use chat_core::traits::{ReactionRepository, ReadReceiptRepository, RepoResult};
use chat_core::value_objects::MessageId;

use crate::models::{ReactionModel, ReadReceiptModel};

use super::error::{map_db_error, map_unique_violation};

/// PostgreSQL implementation of ReactionRepository
#[derive(Clone)]
pub struct PgReactionRepository {
    pool: PgPool,
}

impl PgReactionRepository {
    /// Create a new PgReactionRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReactionRepository for PgReactionRepository {
    #[instrument(skip(self, reaction), fields(message_id = %reaction.message_id))]
    async fn create(&self, reaction: &Reaction) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO message_reactions (message_id, user_id, emoji, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(reaction.message_id.into_inner())
        .bind(reaction.user_id.into_inner())
        .bind(&reaction.emoji)
        .bind(reaction.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::ReactionAlreadyExists))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_message(&self, message_id: MessageId) -> RepoResult<Vec<Reaction>> {
        let results = sqlx::query_as::<_, ReactionModel>(
            r#"
            SELECT message_id, user_id, emoji, created_at
            FROM message_reactions
            WHERE message_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(message_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Reaction::from).collect())
    }
}

/// PostgreSQL implementation of ReadReceiptRepository
#[derive(Clone)]
pub struct PgReadReceiptRepository {
    pool: PgPool,
}

impl PgReadReceiptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadReceiptRepository for PgReadReceiptRepository {
    #[instrument(skip(self, receipt), fields(message_id = %receipt.message_id))]
    async fn record(&self, receipt: &ReadReceipt) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO message_read_receipts (message_id, user_id, read_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (message_id, user_id) DO NOTHING
            "#,
        )
        .bind(receipt.message_id.into_inner())
        .bind(receipt.user_id.into_inner())
        .bind(receipt.read_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn find_by_message(&self, message_id: MessageId) -> RepoResult<Vec<ReadReceipt>> {
        let results = sqlx::query_as::<_, ReadReceiptModel>(
            r#"
            SELECT message_id, user_id, read_at
            FROM message_read_receipts
            WHERE message_id = $1
            ORDER BY read_at
            "#,
        )
        .bind(message_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(ReadReceipt::from).collect())
    }
}
