//! # chat-db
//!
//! Conversation Store: PostgreSQL implementations of the repository traits
//! defined in `chat-core`, via SQLx.
//!
//! Duplicate-conversation prevention relies on the partial unique indexes
//! created by the migrations; a violation surfaces as
//! `DomainError::DuplicateConversation` for the policy layer to resolve.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chat_db::{create_pool, run_migrations, default_migrations_dir, DatabaseConfig};
//! use chat_db::PgConversationRepository;
//!
//! async fn example(url: String) -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig { url, ..DatabaseConfig::default() }).await?;
//!     run_migrations(&pool, default_migrations_dir()).await?;
//!     let conversations = PgConversationRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, default_migrations_dir, ping, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{
    PgConversationRepository, PgMessageRepository, PgParticipantRepository, PgPostingDirectory,
    PgReactionRepository, PgReadReceiptRepository,
};
