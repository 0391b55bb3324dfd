//! Completion gateway for the OpenAI chat endpoint.
//!
//! One request per pipeline invocation, no retries. Request shaping is
//! fixed: the configured model, low temperature, bounded output length.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use forno_core::config::OpenAiConfig;
use forno_core::ModelRequest;

const COMPLETION_TEMPERATURE: f64 = 0.3;
const COMPLETION_MAX_TOKENS: u32 = 300;

/// Returned when the endpoint answers successfully but the body carries no
/// generated text.
pub const FALLBACK_REPLY: &str = "Desculpe, não entendi.";

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("no completion credential is configured")]
    Unconfigured,
    #[error("completion endpoint rejected the credential")]
    Unauthorized,
    #[error("completion endpoint unavailable: {0}")]
    Unavailable(String),
    #[error("completion response could not be decoded: {0}")]
    MalformedResponse(String),
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &ModelRequest) -> Result<String, CompletionError>;
}

pub struct OpenAiGateway {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    chat_completions_url: String,
    model: String,
}

impl OpenAiGateway {
    pub fn new(config: &OpenAiConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            chat_completions_url: format!(
                "{}/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiGateway {
    async fn complete(&self, request: &ModelRequest) -> Result<String, CompletionError> {
        // Checked before any network traffic so an unconfigured deployment
        // fails fast instead of sending a request that will be rejected.
        let Some(api_key) = self.api_key.as_ref() else {
            return Err(CompletionError::Unconfigured);
        };

        let body = request_body(&self.model, request);

        let response = self
            .client
            .post(&self.chat_completions_url)
            .bearer_auth(api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    CompletionError::Unavailable("request timed out".to_string())
                } else {
                    CompletionError::Unavailable(err.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(CompletionError::Unauthorized);
        }
        if !status.is_success() {
            return Err(CompletionError::Unavailable(format!("status {}", status.as_u16())));
        }

        let parsed: ChatCompletionBody = response
            .json()
            .await
            .map_err(|err| CompletionError::MalformedResponse(err.to_string()))?;

        Ok(extract_reply(parsed))
    }
}

fn request_body(model: &str, request: &ModelRequest) -> serde_json::Value {
    json!({
        "model": model,
        "messages": request.entries(),
        "temperature": COMPLETION_TEMPERATURE,
        "max_tokens": COMPLETION_MAX_TOKENS,
    })
}

fn extract_reply(body: ChatCompletionBody) -> String {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_REPLY.to_string())
}

#[derive(Debug, Deserialize)]
struct ChatCompletionBody {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use forno_core::config::OpenAiConfig;
    use forno_core::domain::turn::TurnDraft;
    use forno_core::prompt::{PolicyVariant, PromptPolicy};
    use forno_core::ModelRequest;

    use super::{
        extract_reply, request_body, ChatCompletionBody, CompletionClient, CompletionError,
        OpenAiGateway, FALLBACK_REPLY,
    };

    fn request_fixture() -> ModelRequest {
        let policy = PromptPolicy::for_variant(PolicyVariant::PricedCatalog);
        ModelRequest::assemble(&policy, &[TurnDraft::user("Oi, tem pizza?")], None)
    }

    #[tokio::test]
    async fn missing_credential_short_circuits_before_any_request() {
        // The base URL points at a closed port; reaching the network would
        // surface Unavailable instead of Unconfigured.
        let gateway = OpenAiGateway::new(&OpenAiConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            timeout_secs: 1,
        })
        .expect("build gateway");

        let err = gateway.complete(&request_fixture()).await.expect_err("must fail");
        assert!(matches!(err, CompletionError::Unconfigured));
    }

    #[test]
    fn request_body_carries_fixed_shaping() {
        let body = request_body("gpt-3.5-turbo", &request_fixture());

        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["temperature"], 0.3);
        assert_eq!(body["max_tokens"], 300);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Oi, tem pizza?");
    }

    #[test]
    fn extract_reply_takes_first_choice_content() {
        let body: ChatCompletionBody = serde_json::from_value(serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "Temos sim!" } },
                { "message": { "role": "assistant", "content": "segunda escolha" } }
            ]
        }))
        .expect("decode");

        assert_eq!(extract_reply(body), "Temos sim!");
    }

    #[test]
    fn extract_reply_falls_back_when_content_is_absent() {
        let empty: ChatCompletionBody =
            serde_json::from_value(serde_json::json!({ "choices": [] })).expect("decode");
        assert_eq!(extract_reply(empty), FALLBACK_REPLY);

        let null_content: ChatCompletionBody = serde_json::from_value(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        }))
        .expect("decode");
        assert_eq!(extract_reply(null_content), FALLBACK_REPLY);

        let blank: ChatCompletionBody = serde_json::from_value(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "   " } }]
        }))
        .expect("decode");
        assert_eq!(extract_reply(blank), FALLBACK_REPLY);
    }
}
