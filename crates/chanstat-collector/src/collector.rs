//! Collection run orchestration.
//!
//! A [`ChannelCollector`] owns one in-memory dataset. `collect` drives a
//! run `Idle → Collecting → Complete`; once records exist, later calls
//! return them without touching the channel source until [`reset`] is called.
//!
//! [`reset`]: ChannelCollector::reset

use std::sync::Arc;

use chanstat_core::{AppConfig, ChannelSummary, ContentRecord, DerivedMetrics, Platform};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::client::{ChannelClient, ChannelHandle, RawMessage};
use crate::comments::{CommentResolver, DEFAULT_COMMENT_CAP};
use crate::error::CollectError;
use crate::export::{to_csv, ExportBundle};
use crate::metrics::extract_post;
use crate::scorer::{engagement_rate_outcome, SentimentLexicon};
use crate::summary::{comments_digest, summarize, CommentsDigest};

/// Lifecycle of a collector's dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Collecting,
    Complete,
}

/// Per-collector processing knobs.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Reply texts kept per post.
    pub comment_cap: usize,
    pub lexicon: SentimentLexicon,
    pub platform: Platform,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            comment_cap: DEFAULT_COMMENT_CAP,
            lexicon: SentimentLexicon::default(),
            platform: Platform::Telegram,
        }
    }
}

impl CollectorConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            comment_cap: config.comment_cap,
            ..Self::default()
        }
    }
}

/// Collects one channel's recent posts into [`ContentRecord`]s.
///
/// `collect` takes `&mut self`, so an instance can only be driven by one
/// caller at a time. Share the client across collectors, not the collector.
pub struct ChannelCollector<C: ChannelClient + ?Sized> {
    client: Arc<C>,
    config: CollectorConfig,
    resolver: CommentResolver,
    records: Vec<ContentRecord>,
    collection_timestamp: Option<DateTime<Utc>>,
    state: RunState,
    channel: Option<String>,
}

impl<C: ChannelClient + ?Sized> ChannelCollector<C> {
    pub fn new(client: Arc<C>, config: CollectorConfig) -> Self {
        let resolver = CommentResolver::new(config.comment_cap);
        Self {
            client,
            config,
            resolver,
            records: Vec::new(),
            collection_timestamp: None,
            state: RunState::Idle,
            channel: None,
        }
    }

    /// Collect up to `limit` posts from `channel`.
    ///
    /// Returns the cached dataset when a previous run already produced
    /// records. Per-post failures degrade individual fields and never fail
    /// the run.
    ///
    /// # Errors
    ///
    /// - [`CollectError::Connect`] if the client cannot connect.
    /// - [`CollectError::ChannelResolution`] if `channel` cannot be resolved.
    /// - [`CollectError::BatchFetch`] if the message batch cannot be fetched.
    ///
    /// Resolution and batch-fetch failures still end the run `Complete`,
    /// with no records.
    ///
    /// # Cancellation
    ///
    /// Records are committed only when the batch has been fully processed, so
    /// dropping the future mid-run never exposes a partial dataset. The
    /// instance is left `Collecting` with the client still connected; the
    /// next `collect` disconnects it, discards the run and starts over.
    pub async fn collect(
        &mut self,
        channel: &str,
        limit: usize,
    ) -> Result<&[ContentRecord], CollectError> {
        if self.state == RunState::Collecting {
            tracing::warn!(channel, "previous run was abandoned mid-flight, discarding it");
            if let Err(e) = self.client.disconnect().await {
                tracing::warn!(error = %e, "disconnect of abandoned run failed");
            }
            self.reset();
        }

        if self.has_dataset() {
            if self.channel.as_deref() != Some(channel) {
                tracing::debug!(
                    requested = channel,
                    cached = ?self.channel,
                    "returning dataset cached for a different channel"
                );
            }
            return Ok(&self.records);
        }

        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, channel, limit, "starting collection run");

        self.client
            .connect()
            .await
            .map_err(|source| CollectError::Connect { source })?;

        let result = self.run(run_id, channel, limit).await;
        self.state = RunState::Complete;

        if let Err(e) = self.client.disconnect().await {
            tracing::warn!(%run_id, error = %e, "disconnect failed after collection run");
        }

        match result {
            Ok(records) => {
                self.records = records;
                tracing::info!(
                    %run_id,
                    channel,
                    records = self.records.len(),
                    "collection run complete"
                );
                Ok(&self.records)
            }
            Err(e) => {
                tracing::error!(%run_id, channel, error = %e, "collection run aborted");
                Err(e)
            }
        }
    }

    async fn run(
        &mut self,
        run_id: Uuid,
        channel: &str,
        limit: usize,
    ) -> Result<Vec<ContentRecord>, CollectError> {
        let handle = self.begin_run(channel).await?;

        let messages = self
            .client
            .fetch_messages(&handle, limit)
            .await
            .map_err(|source| CollectError::BatchFetch {
                channel: channel.to_string(),
                source,
            })?;
        tracing::debug!(%run_id, fetched = messages.len(), "fetched message batch");

        let batch = &messages[..messages.len().min(limit)];
        if batch.len() < messages.len() {
            tracing::warn!(
                %run_id,
                fetched = messages.len(),
                limit,
                "channel source returned more messages than requested, truncating"
            );
        }

        let mut records = Vec::with_capacity(batch.len());
        for message in batch.iter().filter(|m| m.has_text()) {
            let sequence_index = records.len() + 1;
            records.push(self.process_message(message, &handle, sequence_index).await);
        }

        let skipped = batch.len() - records.len();
        if skipped > 0 {
            tracing::debug!(%run_id, skipped, "skipped messages without text");
        }
        Ok(records)
    }

    /// Resolve the channel, stamp the collection time and enter `Collecting`.
    async fn begin_run(&mut self, channel: &str) -> Result<ChannelHandle, CollectError> {
        self.collection_timestamp = Some(Utc::now());
        self.channel = Some(channel.to_string());
        self.state = RunState::Collecting;

        self.client
            .resolve_channel(channel)
            .await
            .map_err(|source| CollectError::ChannelResolution {
                channel: channel.to_string(),
                source,
            })
    }

    async fn process_message(
        &self,
        message: &RawMessage,
        handle: &ChannelHandle,
        sequence_index: usize,
    ) -> ContentRecord {
        let post = extract_post(message, handle, self.config.platform, sequence_index);
        let comments = self
            .resolver
            .resolve(self.client.as_ref(), handle, message.id)
            .await;

        let engagement = engagement_rate_outcome(&post.counters, &comments.count);
        if let Some(reason) = engagement.reason() {
            tracing::warn!(
                message_id = message.id,
                metric = "engagement_rate",
                error = %reason,
                "engagement rate degraded to 0"
            );
        }

        let sentiment = self.config.lexicon.score(message.body());
        let derived = DerivedMetrics::new(engagement.into_value(), sentiment, post.counters.views);

        post.into_record(
            comments.comment_count(),
            comments.texts.into_value(),
            derived,
        )
    }

    #[must_use]
    pub fn records(&self) -> &[ContentRecord] {
        &self.records
    }

    #[must_use]
    pub fn collection_timestamp(&self) -> Option<DateTime<Utc>> {
        self.collection_timestamp
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Channel identifier of the current or last run.
    #[must_use]
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    #[must_use]
    pub fn is_run_active(&self) -> bool {
        self.state == RunState::Collecting
    }

    /// Whether a previous run left records that `collect` will return as-is.
    #[must_use]
    pub fn has_dataset(&self) -> bool {
        !self.records.is_empty()
    }

    /// Drop records and timestamp and return to `Idle`.
    pub fn reset(&mut self) {
        self.records.clear();
        self.collection_timestamp = None;
        self.channel = None;
        self.state = RunState::Idle;
    }

    #[must_use]
    pub fn summary(&self) -> ChannelSummary {
        summarize(&self.records, self.collection_timestamp)
    }

    #[must_use]
    pub fn to_csv(&self) -> String {
        to_csv(&self.records)
    }

    #[must_use]
    pub fn comments_digest(&self) -> Option<CommentsDigest> {
        comments_digest(&self.records)
    }

    /// CSV plus summary headers, named after `channel`.
    #[must_use]
    pub fn export_bundle(&self, channel: &str) -> ExportBundle {
        ExportBundle::new(channel, &self.records, self.collection_timestamp)
    }
}

impl<C: ChannelClient + ?Sized> std::fmt::Debug for ChannelCollector<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelCollector")
            .field("config", &self.config)
            .field("records", &self.records.len())
            .field("collection_timestamp", &self.collection_timestamp)
            .field("state", &self.state)
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}
