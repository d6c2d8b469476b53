// sqlx::Error -> AppError mapping
//
// Lives here rather than as a From impl because of the orphan rule
// (neither type is local to this crate).

use queues_core::error::AppError;

/// SQLite result codes: https://www.sqlite.org/rescode.html
const SQLITE_BUSY: &str = "5";
const SQLITE_LOCKED: &str = "6";
const SQLITE_BUSY_RECOVERY: &str = "261";
const SQLITE_LOCKED_SHAREDCACHE: &str = "262";
const SQLITE_BUSY_SNAPSHOT: &str = "517";
const SQLITE_CONSTRAINT_PRIMARYKEY: &str = "1555";
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";
const SQLITE_CONSTRAINT_FOREIGNKEY: &str = "787";
const SQLITE_FULL: &str = "13";

/// Convert sqlx::Error to AppError with structured information
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            let Some(code) = db_err.code() else {
                return AppError::Database(format!("Database error: {}", db_err.message()));
            };

            match code.as_ref() {
                SQLITE_BUSY | SQLITE_LOCKED | SQLITE_BUSY_RECOVERY | SQLITE_LOCKED_SHAREDCACHE
                | SQLITE_BUSY_SNAPSHOT => AppError::Busy(format!(
                    "Database locked ({}): {}",
                    code,
                    db_err.message()
                )),
                SQLITE_CONSTRAINT_UNIQUE | SQLITE_CONSTRAINT_PRIMARYKEY => AppError::Database(
                    format!("Unique constraint violation: {} ({})", db_err.message(), code),
                ),
                SQLITE_CONSTRAINT_FOREIGNKEY => AppError::Database(format!(
                    "Foreign key constraint violation: {} ({})",
                    db_err.message(),
                    code
                )),
                SQLITE_FULL => AppError::Database(format!("Database full: {}", db_err.message())),
                other => AppError::Database(format!(
                    "Database error [{}]: {}",
                    other,
                    db_err.message()
                )),
            }
        }
        // Every connection is checked out; another writer holds them
        sqlx::Error::PoolTimedOut => AppError::Busy("connection pool timed out".to_string()),
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => AppError::Database(format!("Column not found: {}", col)),
        _ => AppError::Database(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_retryable() {
        assert!(map_sqlx_error(sqlx::Error::PoolTimedOut).is_retryable());
    }

    #[test]
    fn test_row_not_found_is_not_retryable() {
        let err = map_sqlx_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Database(_)));
        assert!(!err.is_retryable());
    }
}
