//! Chat-completion capability and an OpenAI-compatible HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use chanstat_core::AppConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Free-text completion for a single user prompt.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any `POST {base}/chat/completions` endpoint speaking the
/// OpenAI request/response shape (OpenRouter, vLLM, ...).
pub struct OpenAiCompatClient {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl OpenAiCompatClient {
    /// Builds a client from `MODEL_*` settings.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::NotConfigured`] when `MODEL_API_URL` is unset, or
    /// the errors of [`OpenAiCompatClient::with_base_url`].
    pub fn from_config(config: &AppConfig) -> Result<Self, LlmError> {
        let base_url = config
            .model_api_url
            .as_deref()
            .ok_or(LlmError::NotConfigured)?;
        Ok(Self::with_base_url(
            base_url,
            &config.model_name,
            config.request_timeout_secs,
        )?
        .with_api_key(config.model_api_key.clone())
        .with_temperature(config.model_temperature))
    }

    /// Creates a client with no API key and temperature `0.2`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::InvalidBaseUrl`] unless `base_url` is an http(s)
    /// URL, or [`LlmError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        base_url: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, LlmError> {
        let parsed = reqwest::Url::parse(base_url).map_err(|e| LlmError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LlmError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: None,
            model: model.to_owned(),
            temperature: 0.2,
        })
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatClient for OpenAiCompatClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "chat completion request");

        let mut builder = self.http.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}
