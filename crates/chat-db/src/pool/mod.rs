mod postgres;

pub use postgres::{create_pool, default_migrations_dir, ping, run_migrations, DatabaseConfig};
pub use sqlx::postgres::PgPool;
