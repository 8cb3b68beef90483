//! Posting title lookup backed by the `postings` table

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use chat_core::traits::{PostingDirectory, RepoResult};

use super::error::map_db_error;

#[derive(Clone)]
pub struct PgPostingDirectory {
    pool: PgPool,
}

impl PgPostingDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostingDirectory for PgPostingDirectory {
    #[instrument(skip(self))]
    async fn posting_title(&self, posting_ref: &str) -> RepoResult<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT title FROM postings WHERE id = $1")
            .bind(posting_ref)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)
    }
}
