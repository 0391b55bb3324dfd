//! The message pipeline: persist the incoming turn, annotate with postal
//! data when a CEP appears, call the completion endpoint, persist the reply.
//!
//! Upstream failures never surface as errors to the caller. The pipeline
//! degrades to a fixed Portuguese reply instead, and only those replies
//! that the model actually generated are persisted as assistant turns.

use std::sync::Arc;

use thiserror::Error;

use forno_core::domain::turn::{Speaker, TurnDraft};
use forno_core::{find_postal_code, ModelRequest, PromptPolicy};
use forno_db::{RepositoryError, TurnRepository};

use crate::cep::CepLookup;
use crate::llm::{CompletionClient, CompletionError};

/// Fixed reply when no completion credential is configured.
pub const CONFIG_ERROR_REPLY: &str =
    "Desculpe, o atendimento automático está temporariamente indisponível. \
     Por favor, tente novamente mais tarde.";

/// Fixed reply when the completion endpoint fails or misbehaves.
pub const UPSTREAM_ERROR_REPLY: &str =
    "Desculpe, estamos com instabilidade no momento. Pode tentar novamente em instantes?";

const CEP_RECHECK_NOTE: &str = "O CEP informado parece inválido ou não encontrado. \
     Peça ao cliente para confirmar ou reenviar.";

fn street_confirmation_note(street: &str) -> String {
    format!("O endereço corresponde à rua {street}. Confirme essa informação com o cliente.")
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("conversation window is empty")]
    EmptyWindow,
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyKind {
    /// Produced by the model and persisted as an assistant turn.
    Generated,
    /// Degraded reply for a missing credential. Not persisted.
    ConfigurationError,
    /// Degraded reply for an endpoint failure. Not persisted.
    UpstreamError,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineReply {
    pub text: String,
    pub kind: ReplyKind,
}

pub struct MessagePipeline {
    policy: PromptPolicy,
    turns: Arc<dyn TurnRepository>,
    completion: Arc<dyn CompletionClient>,
    cep: Arc<dyn CepLookup>,
}

impl MessagePipeline {
    pub fn new(
        policy: PromptPolicy,
        turns: Arc<dyn TurnRepository>,
        completion: Arc<dyn CompletionClient>,
        cep: Arc<dyn CepLookup>,
    ) -> Self {
        Self { policy, turns, completion, cep }
    }

    /// Runs one invocation over a conversation window whose last element is
    /// the turn being handled. The window arrives already truncated by the
    /// caller; it is forwarded to the model as-is.
    pub async fn handle(&self, window: &[TurnDraft]) -> Result<PipelineReply, PipelineError> {
        let current = window.last().ok_or(PipelineError::EmptyWindow)?;

        // Durable before anything that can fail further down.
        self.turns.append(current.speaker, &current.text).await?;

        let postal_note = match find_postal_code(&current.text) {
            Some(code) => Some(self.resolve_postal_note(code).await),
            None => None,
        };

        let request = ModelRequest::assemble(&self.policy, window, postal_note);

        let reply_text = match self.completion.complete(&request).await {
            Ok(text) => text,
            Err(CompletionError::Unconfigured) => {
                tracing::error!(event_name = "completion_unconfigured", "no credential configured");
                return Ok(PipelineReply {
                    text: CONFIG_ERROR_REPLY.to_string(),
                    kind: ReplyKind::ConfigurationError,
                });
            }
            Err(err) => {
                tracing::error!(
                    event_name = "completion_failed",
                    error = %err,
                    "completion endpoint failed"
                );
                return Ok(PipelineReply {
                    text: UPSTREAM_ERROR_REPLY.to_string(),
                    kind: ReplyKind::UpstreamError,
                });
            }
        };

        self.turns.append(Speaker::Assistant, &reply_text).await?;

        Ok(PipelineReply { text: reply_text, kind: ReplyKind::Generated })
    }

    /// A lookup failure never aborts the invocation; the model is told to
    /// ask the customer to re-check the code instead.
    async fn resolve_postal_note(&self, code: &str) -> String {
        match self.cep.resolve(code).await {
            Ok(street) => {
                tracing::info!(event_name = "cep_resolved", street = %street, "CEP resolved");
                street_confirmation_note(&street)
            }
            Err(err) => {
                tracing::warn!(event_name = "cep_lookup_failed", error = %err, "CEP lookup failed");
                CEP_RECHECK_NOTE.to_string()
            }
        }
    }
}
