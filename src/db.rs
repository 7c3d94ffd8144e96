//! Database module
//!
//! Connection, schema bootstrap and verification utilities.

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

/// Initial schema, applied idempotently (every statement is IF NOT EXISTS)
const INIT_SQL: &str = include_str!("../migrations/0001_init.sql");

/// Tables the API reads and writes
const REQUIRED_TABLES: &[&str] = &[
    "users",
    "api_keys",
    "budgets",
    "expenses",
    "borrowings",
    "lendings",
];

/// Create a PostgreSQL connection pool
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the bundled schema.
///
/// Executed as one simple-protocol batch, which allows multiple statements.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool.execute(INIT_SQL).await?;
    tracing::info!("Database schema applied");
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_sql_creates_required_tables() {
        for table in REQUIRED_TABLES {
            let stmt = format!("CREATE TABLE IF NOT EXISTS {} (", table);
            assert!(INIT_SQL.contains(&stmt), "missing table {}", table);
        }
    }

    #[test]
    fn test_budget_uniqueness_in_schema() {
        assert!(INIT_SQL.contains("UNIQUE (user_id, year, month_number)"));
    }
}
