//! HTTP client for a JSON channel bridge.
//!
//! The bridge exposes a Telegram-style broadcast channel over REST:
//!
//! | Request | Response |
//! |---------|----------|
//! | `GET channels/{name}` | [`ChannelHandle`] |
//! | `GET channels/{name}/messages?limit=N` | `{"messages": [RawMessage]}` |
//! | `GET channels/{name}/messages/{id}/discussion` | [`ThreadMetadata`], 404 when absent |
//! | `GET channels/{name}/messages/{id}/replies?limit=N` | `{"replies": [{"text": ..}]}` |

use std::time::Duration;

use async_trait::async_trait;
use chanstat_core::AppConfig;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::retry::RetryPolicy;
use super::{ChannelClient, ChannelHandle, RawMessage, ThreadMetadata};
use crate::error::ChannelClientError;

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    messages: Vec<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RepliesResponse {
    #[serde(default)]
    replies: Vec<ReplyItem>,
}

#[derive(Debug, Deserialize)]
struct ReplyItem {
    #[serde(default)]
    text: Option<String>,
}

/// [`ChannelClient`] backed by the channel bridge REST API.
///
/// Use [`HttpChannelClient::from_config`] in the binary and
/// [`HttpChannelClient::with_base_url`] to point at a mock server in tests.
pub struct HttpChannelClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
    retry: RetryPolicy,
}

impl HttpChannelClient {
    /// Builds a client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelClientError::InvalidBaseUrl`] if the configured URL is
    /// not an absolute http(s) URL, or [`ChannelClientError::Http`] if the
    /// underlying `reqwest::Client` cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, ChannelClientError> {
        Ok(Self::with_base_url(
            &config.channel_api_url,
            config.request_timeout_secs,
            &config.user_agent,
        )?
        .with_token(config.channel_api_token.clone())
        .with_retries(config.max_retries, config.retry_backoff_base_ms)
        .with_max_backoff(config.retry_max_delay_ms))
    }

    /// Creates a client with no auth token and retries disabled.
    ///
    /// # Errors
    ///
    /// Same as [`HttpChannelClient::from_config`].
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ChannelClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so path segments append instead of
        // replacing the last one.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| ChannelClientError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ChannelClientError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        Ok(Self {
            client,
            base_url: parsed,
            token: None,
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.retry.max_retries = max_retries;
        self.retry.base_delay_ms = backoff_base_ms;
        self
    }

    /// Ceiling for a single back-off delay; 30 s unless overridden.
    #[must_use]
    pub fn with_max_backoff(mut self, max_delay_ms: u64) -> Self {
        self.retry.max_delay_ms = max_delay_ms;
        self
    }

    /// Appends path segments to the base URL; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Sends a GET and returns the body, or `None` on 404.
    async fn get_body(&self, url: &Url) -> Result<Option<String>, ChannelClientError> {
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ChannelClientError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(Some(response.text().await?))
    }

    async fn get_with_retry(&self, url: &Url) -> Result<Option<String>, ChannelClientError> {
        self.retry.run(|| self.get_body(url)).await
    }
}

fn decode<T: DeserializeOwned>(body: &str, context: &Url) -> Result<T, ChannelClientError> {
    serde_json::from_str(body).map_err(|e| ChannelClientError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}

/// Reduces `@name`, `t.me/name` and `https://t.me/name` to `name`.
#[must_use]
pub fn normalize_channel_identifier(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_host = ["https://t.me/", "http://t.me/", "t.me/"]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);
    without_host.trim_start_matches('@').trim_end_matches('/')
}

#[async_trait]
impl ChannelClient for HttpChannelClient {
    async fn resolve_channel(&self, identifier: &str) -> Result<ChannelHandle, ChannelClientError> {
        let name = normalize_channel_identifier(identifier);
        let url = self.endpoint(&["channels", name]);
        match self.get_with_retry(&url).await? {
            Some(body) => decode(&body, &url),
            None => Err(ChannelClientError::NotFound {
                url: url.to_string(),
            }),
        }
    }

    async fn fetch_messages(
        &self,
        channel: &ChannelHandle,
        limit: usize,
    ) -> Result<Vec<RawMessage>, ChannelClientError> {
        let mut url = self.endpoint(&["channels", &channel.username, "messages"]);
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());

        let body = self
            .get_with_retry(&url)
            .await?
            .ok_or_else(|| ChannelClientError::NotFound {
                url: url.to_string(),
            })?;
        let parsed: MessagesResponse = decode(&body, &url)?;

        let mut messages = parsed.messages;
        messages.truncate(limit);
        Ok(messages)
    }

    async fn fetch_discussion_thread(
        &self,
        channel: &ChannelHandle,
        message_id: i64,
    ) -> Result<Option<ThreadMetadata>, ChannelClientError> {
        let id = message_id.to_string();
        let url = self.endpoint(&["channels", &channel.username, "messages", &id, "discussion"]);
        match self.get_body(&url).await? {
            Some(body) => decode(&body, &url).map(Some),
            None => Ok(None),
        }
    }

    async fn fetch_replies(
        &self,
        channel: &ChannelHandle,
        message_id: i64,
        limit: usize,
    ) -> Result<Vec<String>, ChannelClientError> {
        let id = message_id.to_string();
        let mut url = self.endpoint(&["channels", &channel.username, "messages", &id, "replies"]);
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());

        let Some(body) = self.get_body(&url).await? else {
            return Ok(Vec::new());
        };
        let parsed: RepliesResponse = decode(&body, &url)?;
        Ok(parsed
            .replies
            .into_iter()
            .filter_map(|reply| reply.text)
            .take(limit)
            .collect())
    }
}
