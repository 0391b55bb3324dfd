//! Postal code resolution against the ViaCEP directory.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use forno_core::config::CepConfig;
use forno_core::normalize_postal_code;

#[derive(Debug, Error)]
pub enum CepError {
    #[error("postal code not found in the directory")]
    NotFound,
    #[error("postal code `{0}` is not a valid CEP")]
    Invalid(String),
    #[error("postal directory unavailable: {0}")]
    Unavailable(String),
}

/// Resolves a Brazilian postal code (CEP) to its street name.
#[async_trait]
pub trait CepLookup: Send + Sync {
    async fn resolve(&self, raw_code: &str) -> Result<String, CepError>;
}

pub struct ViaCepClient {
    client: reqwest::Client,
    base_url: String,
}

impl ViaCepClient {
    pub fn new(config: &CepConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, base_url: config.base_url.trim_end_matches('/').to_string() })
    }
}

#[async_trait]
impl CepLookup for ViaCepClient {
    async fn resolve(&self, raw_code: &str) -> Result<String, CepError> {
        let digits = normalize_postal_code(raw_code);
        if digits.len() != 8 {
            return Err(CepError::Invalid(raw_code.to_string()));
        }

        let url = format!("{}/{digits}/json/", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| CepError::Unavailable(err.to_string()))?;

        let status = response.status();
        // ViaCEP answers 400 for syntactically bad codes.
        if status.is_client_error() {
            return Err(CepError::Invalid(raw_code.to_string()));
        }
        if !status.is_success() {
            return Err(CepError::Unavailable(format!("status {}", status.as_u16())));
        }

        let body: ViaCepBody = response
            .json()
            .await
            .map_err(|err| CepError::Unavailable(err.to_string()))?;

        street_from_body(body)
    }
}

fn street_from_body(body: ViaCepBody) -> Result<String, CepError> {
    if body.erro {
        return Err(CepError::NotFound);
    }

    match body.logradouro {
        Some(street) if !street.trim().is_empty() => Ok(street),
        _ => Err(CepError::NotFound),
    }
}

#[derive(Debug, Deserialize)]
struct ViaCepBody {
    #[serde(default, deserialize_with = "truthy_flag")]
    erro: bool,
    logradouro: Option<String>,
}

/// ViaCEP has emitted both `"erro": true` and `"erro": "true"` over time.
fn truthy_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(flag) => flag,
        serde_json::Value::String(text) => text == "true",
        _ => false,
    })
}
