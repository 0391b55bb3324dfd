use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

use forno_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

/// Opens the turn-log pool. Every session gets WAL (history reads stay
/// consistent while a turn is appended), foreign keys, and a busy timeout
/// so concurrent appends queue instead of failing.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(config.timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(&config.url)
        .await
}

#[cfg(test)]
mod tests {
    use forno_core::config::DatabaseConfig;

    use super::connect;

    fn memory_config() -> DatabaseConfig {
        DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn connect_applies_session_pragmas() {
        let pool = connect(&memory_config()).await.expect("connect");

        let foreign_keys: i64 =
            sqlx::query_scalar("PRAGMA foreign_keys").fetch_one(&pool).await.expect("pragma");
        assert_eq!(foreign_keys, 1);

        let busy_timeout: i64 =
            sqlx::query_scalar("PRAGMA busy_timeout").fetch_one(&pool).await.expect("pragma");
        assert_eq!(busy_timeout, 5000);
    }

    #[tokio::test]
    async fn zero_limits_are_clamped_to_usable_values() {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 0,
            timeout_secs: 0,
        };

        let pool = connect(&config).await.expect("connect despite zero limits");
        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await.expect("query");
        assert_eq!(one, 1);
    }
}
