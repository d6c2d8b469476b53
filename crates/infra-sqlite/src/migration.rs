// Migration Runner

use crate::error::map_sqlx_error;
use queues_core::error::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Ordered migrations: (version, description, SQL)
const MIGRATIONS: &[(i64, &str, &str)] = &[(
    1,
    "Initial schema (queues, slots, entities)",
    include_str!("../migrations/001_initial_schema.sql"),
)];

/// Run database migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    let current_version = current_version(pool).await?;
    info!("Current schema version: {}", current_version);

    for (version, description, sql) in MIGRATIONS {
        if current_version < *version {
            info!("Applying migration {:03}: {}", version, description);
            apply_migration(pool, sql).await?;
        }
    }

    info!("All migrations applied successfully");
    Ok(())
}

/// Highest applied version, 0 for a fresh database
pub async fn current_version(pool: &SqlitePool) -> Result<i64> {
    let table_exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
    )
    .fetch_one(pool)
    .await
    .map_err(map_sqlx_error)?;

    if table_exists == 0 {
        return Ok(0);
    }

    let version: Option<i64> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await
            .map_err(map_sqlx_error)?;
    Ok(version.unwrap_or(0))
}

/// Apply a single migration SQL file
async fn apply_migration(pool: &SqlitePool, sql: &str) -> Result<()> {
    // Execute migration in a transaction
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    // Split by semicolon and execute each statement
    for statement in sql.split(';') {
        // Remove comments and trim
        let clean_statement: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        if !clean_statement.is_empty() {
            sqlx::query(&clean_statement)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }
    }

    tx.commit().await.map_err(map_sqlx_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_pool;

    #[tokio::test]
    async fn test_run_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_pool(dir.path().join("m.db").to_str().unwrap())
            .await
            .unwrap();
        let result = run_migrations(&pool).await;

        if let Err(e) = &result {
            eprintln!("Migration error: {:?}", e);
        }
        assert!(result.is_ok());

        // Check that tables exist
        for table in ["queues", "slots", "entities"] {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(count, 0, "table {} should start empty", table);
        }
        assert_eq!(current_version(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_pool(dir.path().join("m.db").to_str().unwrap())
            .await
            .unwrap();

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }
}
