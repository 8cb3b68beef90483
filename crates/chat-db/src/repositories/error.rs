use chat_core::error::DomainError;
use sqlx::Error as SqlxError;

/// Any sqlx failure surfaces as an opaque database error
pub fn map_db_error(e: SqlxError) -> DomainError {
    tracing::debug!(error = %e, "Query failed");
    DomainError::DatabaseError(e.to_string())
}

/// Like [`map_db_error`], except a unique-constraint hit becomes `on_unique()`
pub fn map_unique_violation(e: SqlxError, on_unique: impl FnOnce() -> DomainError) -> DomainError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => on_unique(),
        _ => map_db_error(e),
    }
}
