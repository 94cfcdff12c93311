//! Discussion-thread resolution for a single channel post.

use crate::client::{ChannelClient, ChannelHandle};
use crate::outcome::Outcome;

/// Default number of reply texts kept per post.
pub const DEFAULT_COMMENT_CAP: usize = 10;

/// Comment count and reply texts for one post.
///
/// The two halves are fetched independently; either may be degraded while
/// the other still carries a real value.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentData {
    pub count: Outcome<u64>,
    pub texts: Outcome<Vec<String>>,
}

impl CommentData {
    /// No thread: zero comments, no texts, nothing degraded.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            count: Outcome::Value(0),
            texts: Outcome::Value(Vec::new()),
        }
    }

    #[must_use]
    pub fn comment_count(&self) -> u64 {
        *self.count.value()
    }

    #[must_use]
    pub fn has_comments(&self) -> bool {
        self.comment_count() > 0
    }

    #[must_use]
    pub fn texts_retrieved(&self) -> usize {
        self.texts.value().len()
    }
}

/// Fetches [`CommentData`] through a [`ChannelClient`]. Single attempt per
/// post, no retries.
#[derive(Debug, Clone, Copy)]
pub struct CommentResolver {
    cap: usize,
}

impl Default for CommentResolver {
    fn default() -> Self {
        Self::new(DEFAULT_COMMENT_CAP)
    }
}

impl CommentResolver {
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self { cap }
    }

    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Resolve the count and texts concurrently. Never fails: each branch
    /// that errors degrades to its zero value and is logged.
    pub async fn resolve<C>(&self, client: &C, channel: &ChannelHandle, message_id: i64) -> CommentData
    where
        C: ChannelClient + ?Sized,
    {
        let (count, texts) = tokio::join!(
            self.fetch_count(client, channel, message_id),
            self.fetch_texts(client, channel, message_id),
        );

        if let Some(reason) = count.reason() {
            tracing::warn!(
                channel = %channel.username,
                message_id,
                metric = "comment_count",
                error = %reason,
                "comment count unavailable, using 0"
            );
        }
        if let Some(reason) = texts.reason() {
            tracing::warn!(
                channel = %channel.username,
                message_id,
                metric = "comment_texts",
                error = %reason,
                "comment texts unavailable, using empty list"
            );
        }

        CommentData { count, texts }
    }

    async fn fetch_count<C>(&self, client: &C, channel: &ChannelHandle, message_id: i64) -> Outcome<u64>
    where
        C: ChannelClient + ?Sized,
    {
        let thread = client.fetch_discussion_thread(channel, message_id).await;
        Outcome::from_result(
            thread.map(|t| t.map_or(0, |meta| meta.reply_count())),
            0,
        )
    }

    async fn fetch_texts<C>(
        &self,
        client: &C,
        channel: &ChannelHandle,
        message_id: i64,
    ) -> Outcome<Vec<String>>
    where
        C: ChannelClient + ?Sized,
    {
        if self.cap == 0 {
            return Outcome::Value(Vec::new());
        }
        let replies = client.fetch_replies(channel, message_id, self.cap).await;
        Outcome::from_result(replies.map(|raw| clean_replies(raw, self.cap)), Vec::new())
    }
}

/// Trim replies, drop blank ones, keep the first `cap`.
fn clean_replies(raw: Vec<String>, cap: usize) -> Vec<String> {
    raw.into_iter()
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .take(cap)
        .collect()
}
