//! JSON API for the chat front-end.
//!
//! - `POST /api/messages` — run one pipeline invocation over the submitted
//!   conversation window, reply with the assistant text.
//! - `GET  /api/messages` — full persisted history, oldest first.
//! - `GET  /api/cep?cep=` — resolve a postal code to its street.
//! - `GET  /`             — static chat page.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tracing::{error, info};
use uuid::Uuid;

use forno_agent::{CepError, CepLookup, MessagePipeline, PipelineError, ReplyKind};
use forno_core::domain::turn::{Speaker, TurnDraft};
use forno_core::MAX_WINDOW_TURNS;
use forno_db::TurnRepository;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<MessagePipeline>,
    pub turns: Arc<dyn TurnRepository>,
    pub cep: Arc<dyn CepLookup>,
}

#[derive(Debug, Deserialize)]
pub struct PostMessagesRequest {
    pub messages: Vec<MessageBody>,
}

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    pub speaker: Speaker,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub id: i64,
    pub speaker: Speaker,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct StreetResponse {
    pub street: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct CepQuery {
    pub cep: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/messages", post(post_messages).get(get_messages))
        .route("/api/cep", get(get_cep))
        .fallback_service(ServeDir::new("static"))
        .with_state(state)
}

async fn post_messages(
    State(state): State<AppState>,
    Json(body): Json<PostMessagesRequest>,
) -> Result<(StatusCode, Json<ReplyResponse>), (StatusCode, Json<ApiError>)> {
    let correlation_id = Uuid::new_v4().simple().to_string();

    let drafts: Vec<TurnDraft> = body
        .messages
        .into_iter()
        .map(|message| TurnDraft { speaker: message.speaker, text: message.text })
        .collect();

    let current = drafts.last().ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError { error: "messages must not be empty".to_string() }),
        )
    })?;
    if current.text.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError { error: "message text must not be empty".to_string() }),
        ));
    }

    // Only the most recent turns are forwarded; older context is dropped here,
    // not in the pipeline.
    let window = &drafts[drafts.len().saturating_sub(MAX_WINDOW_TURNS)..];

    info!(
        event_name = "api.messages.received",
        correlation_id = %correlation_id,
        window_len = window.len(),
        "handling conversation turn"
    );

    match state.pipeline.handle(window).await {
        Ok(reply) => match reply.kind {
            ReplyKind::Generated => {
                info!(
                    event_name = "api.messages.replied",
                    correlation_id = %correlation_id,
                    "assistant reply generated"
                );
                Ok((StatusCode::OK, Json(ReplyResponse { reply: reply.text })))
            }
            ReplyKind::ConfigurationError | ReplyKind::UpstreamError => {
                // Degraded replies still carry chat text so the front-end can
                // show them in the conversation.
                Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(ReplyResponse { reply: reply.text })))
            }
        },
        Err(PipelineError::EmptyWindow) => Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError { error: "messages must not be empty".to_string() }),
        )),
        Err(PipelineError::Storage(err)) => {
            error!(
                event_name = "api.messages.storage_failed",
                correlation_id = %correlation_id,
                error = %err,
                "conversation log write failed"
            );
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError { error: "internal server error".to_string() }),
            ))
        }
    }
}

async fn get_messages(
    State(state): State<AppState>,
) -> Result<Json<Vec<TurnResponse>>, (StatusCode, Json<ApiError>)> {
    let turns = state.turns.list_all().await.map_err(|err| {
        error!(event_name = "api.messages.list_failed", error = %err, "history read failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError { error: "failed to load history".to_string() }),
        )
    })?;

    Ok(Json(
        turns
            .into_iter()
            .map(|turn| TurnResponse {
                id: turn.id,
                speaker: turn.speaker,
                text: turn.text,
                created_at: turn.created_at,
            })
            .collect(),
    ))
}

async fn get_cep(
    State(state): State<AppState>,
    Query(query): Query<CepQuery>,
) -> Result<Json<StreetResponse>, (StatusCode, Json<ApiError>)> {
    let raw = query.cep.as_deref().map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError { error: "CEP inválido".to_string() }),
        ));
    }

    match state.cep.resolve(raw).await {
        Ok(street) => Ok(Json(StreetResponse { street })),
        Err(CepError::Invalid(_)) => {
            Err((StatusCode::BAD_REQUEST, Json(ApiError { error: "CEP inválido".to_string() })))
        }
        Err(CepError::NotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError { error: "CEP não encontrado".to_string() }),
        )),
        Err(CepError::Unavailable(err)) => {
            error!(event_name = "api.cep.unavailable", error = %err, "CEP directory unavailable");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError { error: "erro ao buscar o CEP".to_string() }),
            ))
        }
    }
}
