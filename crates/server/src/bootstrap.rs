use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use forno_agent::{MessagePipeline, OpenAiGateway, ViaCepClient};
use forno_core::config::{AppConfig, ConfigError, LoadOptions};
use forno_core::PromptPolicy;
use forno_db::{connect, migrations, DbPool, SqlTurnRepository};

use crate::routes::AppState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let turns = Arc::new(SqlTurnRepository::new(db_pool.clone()));
    let completion =
        Arc::new(OpenAiGateway::new(&config.openai).map_err(BootstrapError::HttpClient)?);
    let cep = Arc::new(ViaCepClient::new(&config.cep).map_err(BootstrapError::HttpClient)?);

    if config.openai.api_key.is_none() {
        tracing::warn!(
            event_name = "system.bootstrap.no_completion_credential",
            correlation_id = "bootstrap",
            "no completion API key configured; replies will degrade until one is provided"
        );
    }

    let pipeline = Arc::new(MessagePipeline::new(
        PromptPolicy::for_variant(config.policy.variant),
        turns.clone(),
        completion,
        cep.clone(),
    ));

    let state = AppState { pipeline, turns, cep };

    Ok(Application { config, db_pool, state })
}

#[cfg(test)]
mod tests {
    use forno_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn memory_options() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations() {
        let app = bootstrap(memory_options()).await.expect("bootstrap");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'turn'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("query sqlite_master");
        assert_eq!(table_count, 1);

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_succeeds_without_completion_credential() {
        let app = bootstrap(memory_options()).await.expect("bootstrap");
        assert!(app.config.openai.api_key.is_none());
        app.db_pool.close().await;
    }
}
