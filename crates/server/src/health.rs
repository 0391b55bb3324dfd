//! Readiness probe on its own listener, kept reachable even when the main
//! listener is saturated. Reports the two things an operator needs to tell
//! "down" from "degraded": whether the turn log is reachable, and whether a
//! completion credential is configured.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use forno_db::DbPool;

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    completion_configured: bool,
}

impl HealthState {
    pub fn new(db_pool: DbPool, completion_configured: bool) -> Self {
        Self { db_pool, completion_configured }
    }
}

#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub ready: bool,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub database: ComponentStatus,
    pub completion: ComponentStatus,
    pub checked_at: DateTime<Utc>,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn spawn(bind_address: &str, port: u16, state: HealthState) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(state)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthReport>) {
    let database = match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&state.db_pool).await
    {
        Ok(_) => ComponentStatus { ready: true, detail: "turn log reachable".to_string() },
        Err(error) => {
            ComponentStatus { ready: false, detail: format!("turn log query failed: {error}") }
        }
    };

    // A missing credential degrades every reply to a fixed message but the
    // service keeps answering, so it never fails the probe on its own.
    let completion = if state.completion_configured {
        ComponentStatus { ready: true, detail: "completion credential configured".to_string() }
    } else {
        ComponentStatus {
            ready: false,
            detail: "no completion credential; replies degrade to a fixed message".to_string(),
        }
    };

    let status_code =
        if database.ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let status = if database.ready && completion.ready { "ready" } else { "degraded" };

    (status_code, Json(HealthReport { status, database, completion, checked_at: Utc::now() }))
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};

    use forno_core::config::DatabaseConfig;
    use forno_db::{connect, DbPool};

    use crate::health::{health, HealthState};

    async fn pool_fixture() -> DbPool {
        let config = DatabaseConfig {
            url: "sqlite::memory:?cache=shared".to_string(),
            max_connections: 1,
            timeout_secs: 5,
        };
        connect(&config).await.expect("pool should connect")
    }

    #[tokio::test]
    async fn ready_when_turn_log_reachable_and_credential_configured() {
        let pool = pool_fixture().await;

        let (status, Json(report)) = health(State(HealthState::new(pool.clone(), true))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report.status, "ready");
        assert!(report.database.ready);
        assert!(report.completion.ready);

        pool.close().await;
    }

    #[tokio::test]
    async fn missing_credential_reports_degraded_but_stays_up() {
        let pool = pool_fixture().await;

        let (status, Json(report)) = health(State(HealthState::new(pool.clone(), false))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report.status, "degraded");
        assert!(report.database.ready);
        assert!(!report.completion.ready);
        assert!(report.completion.detail.contains("credential"));

        pool.close().await;
    }

    #[tokio::test]
    async fn unreachable_turn_log_is_service_unavailable() {
        let pool = pool_fixture().await;
        pool.close().await;

        let (status, Json(report)) = health(State(HealthState::new(pool, true))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(report.status, "degraded");
        assert!(!report.database.ready);
        assert!(report.completion.ready);
    }
}
