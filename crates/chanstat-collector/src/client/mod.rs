//! Channel source capability and the raw message shapes it produces.

pub mod http;
mod retry;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ChannelClientError;

/// A resolved channel, as returned by [`ChannelClient::resolve_channel`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelHandle {
    pub id: i64,
    /// Public username, used to build post links.
    pub username: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// One reaction bucket on a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub count: u64,
}

/// Attached media, reduced to what classification needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Media {
    Photo,
    Document { mime_type: String },
    #[serde(other)]
    Other,
}

/// A channel message exactly as the source delivered it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: i64,
    #[serde(default)]
    pub text: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub views: Option<u64>,
    #[serde(default)]
    pub forwards: Option<u64>,
    #[serde(default)]
    pub reactions: Option<Vec<Reaction>>,
    #[serde(default)]
    pub media: Option<Media>,
    /// Id of the linked discussion group, when the channel has one.
    #[serde(default)]
    pub discussion_id: Option<i64>,
}

impl RawMessage {
    /// Message body, empty string when absent.
    #[must_use]
    pub fn body(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.body().is_empty()
    }
}

/// Discussion-thread metadata for one channel post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMetadata {
    #[serde(default)]
    pub replies_count: Option<u64>,
    /// Highest reply id; only meaningful when `replies_count` is absent.
    #[serde(default)]
    pub max_id: Option<u64>,
    #[serde(default)]
    pub chat_id: Option<i64>,
    #[serde(default)]
    pub reply_to_msg_id: Option<i64>,
}

impl ThreadMetadata {
    /// Reply count, preferring the explicit count over the `max_id` fallback.
    #[must_use]
    pub fn reply_count(&self) -> u64 {
        self.replies_count.or(self.max_id).unwrap_or(0)
    }
}

/// Capability to read a broadcast channel.
///
/// Implementations own their own connection and timeout policy; the
/// collector never retries on their behalf.
#[async_trait]
pub trait ChannelClient: Send + Sync {
    async fn connect(&self) -> Result<(), ChannelClientError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ChannelClientError> {
        Ok(())
    }

    async fn resolve_channel(&self, identifier: &str) -> Result<ChannelHandle, ChannelClientError>;

    /// Fetch at most `limit` messages, in the order the source returns them.
    async fn fetch_messages(
        &self,
        channel: &ChannelHandle,
        limit: usize,
    ) -> Result<Vec<RawMessage>, ChannelClientError>;

    /// `Ok(None)` when the post has no accessible discussion thread.
    async fn fetch_discussion_thread(
        &self,
        channel: &ChannelHandle,
        message_id: i64,
    ) -> Result<Option<ThreadMetadata>, ChannelClientError>;

    /// Raw reply bodies for a post, at most `limit`. Empty when there is no thread.
    async fn fetch_replies(
        &self,
        channel: &ChannelHandle,
        message_id: i64,
        limit: usize,
    ) -> Result<Vec<String>, ChannelClientError>;
}
