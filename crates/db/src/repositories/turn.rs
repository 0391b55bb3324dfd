use chrono::{DateTime, Utc};
use sqlx::Row;

use forno_core::domain::turn::{Speaker, Turn};

use super::{RepositoryError, TurnRepository};
use crate::DbPool;

pub struct SqlTurnRepository {
    pool: DbPool,
}

impl SqlTurnRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TurnRepository for SqlTurnRepository {
    async fn append(&self, speaker: Speaker, text: &str) -> Result<Turn, RepositoryError> {
        let created_at = Utc::now();

        let result = sqlx::query("INSERT INTO turn (speaker, text, created_at) VALUES (?, ?, ?)")
            .bind(speaker.as_str())
            .bind(text)
            .bind(created_at)
            .execute(&self.pool)
            .await?;

        Ok(Turn { id: result.last_insert_rowid(), speaker, text: text.to_string(), created_at })
    }

    async fn list_all(&self) -> Result<Vec<Turn>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, speaker, text, created_at FROM turn ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let speaker: String = row.try_get("speaker")?;
                let speaker = speaker
                    .parse::<Speaker>()
                    .map_err(|err| RepositoryError::Decode(err.to_string()))?;
                let created_at: DateTime<Utc> = row.try_get("created_at")?;

                Ok(Turn { id: row.try_get("id")?, speaker, text: row.try_get("text")?, created_at })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use forno_core::config::DatabaseConfig;
    use forno_core::domain::turn::Speaker;

    use super::SqlTurnRepository;
    use crate::migrations::run_pending;
    use crate::repositories::TurnRepository;
    use crate::{connect, DbPool};

    async fn pool_fixture() -> DbPool {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            timeout_secs: 30,
        };
        let pool = connect(&config).await.expect("connect");
        run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[tokio::test]
    async fn append_assigns_id_and_timestamp() {
        let repo = SqlTurnRepository::new(pool_fixture().await);

        let first = repo.append(Speaker::User, "Oi, tem pizza?").await.expect("append first");
        let second = repo.append(Speaker::Assistant, "Temos sim!").await.expect("append second");

        assert!(first.id > 0);
        assert!(second.id > first.id);
        assert!(second.created_at >= first.created_at);
        assert_eq!(first.speaker, Speaker::User);
        assert_eq!(first.text, "Oi, tem pizza?");
    }

    #[tokio::test]
    async fn list_all_returns_chronological_order() {
        let repo = SqlTurnRepository::new(pool_fixture().await);

        repo.append(Speaker::User, "primeira").await.expect("append");
        repo.append(Speaker::Assistant, "segunda").await.expect("append");
        repo.append(Speaker::User, "terceira").await.expect("append");

        let turns = repo.list_all().await.expect("list");

        assert_eq!(turns.len(), 3);
        assert_eq!(
            turns.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            vec!["primeira", "segunda", "terceira"],
        );
        assert!(turns.windows(2).all(|pair| pair[0].created_at <= pair[1].created_at));
    }

    #[tokio::test]
    async fn list_all_on_empty_log_is_empty() {
        let repo = SqlTurnRepository::new(pool_fixture().await);
        let turns = repo.list_all().await.expect("list");
        assert!(turns.is_empty());
    }
}
