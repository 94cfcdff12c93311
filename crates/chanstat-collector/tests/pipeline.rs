//! End-to-end collection runs against an in-memory channel source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chanstat_collector::{
    ChannelClient, ChannelClientError, ChannelCollector, ChannelHandle, CollectError,
    CollectorConfig, RawMessage, Reaction, RunState, ThreadMetadata, CSV_HEADERS,
};
use chrono::{TimeZone, Utc};

#[derive(Default)]
struct FakeChannel {
    messages: Vec<RawMessage>,
    threads: HashMap<i64, ThreadMetadata>,
    replies: HashMap<i64, Vec<String>>,
    failing_counts: Vec<i64>,
    failing_replies: Vec<i64>,
    unresolvable: bool,
    batch_fails: bool,
    connect_fails: bool,
    /// Thread lookup for this message hangs the first time it is made.
    stalls_once: Option<i64>,
    stalled: AtomicBool,
    fetch_calls: AtomicUsize,
    lifecycle: Mutex<Vec<&'static str>>,
}

impl FakeChannel {
    fn with_messages(messages: Vec<RawMessage>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    fn lifecycle(&self) -> Vec<&'static str> {
        self.lifecycle.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelClient for FakeChannel {
    async fn connect(&self) -> Result<(), ChannelClientError> {
        self.lifecycle.lock().unwrap().push("connect");
        if self.connect_fails {
            return Err(ChannelClientError::Unavailable("auth key revoked".to_string()));
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ChannelClientError> {
        self.lifecycle.lock().unwrap().push("disconnect");
        Ok(())
    }

    async fn resolve_channel(&self, identifier: &str) -> Result<ChannelHandle, ChannelClientError> {
        if self.unresolvable {
            return Err(ChannelClientError::NotFound {
                url: format!("fake://{identifier}"),
            });
        }
        Ok(ChannelHandle {
            id: 100,
            username: identifier.to_string(),
            title: Some("Fake".to_string()),
        })
    }

    async fn fetch_messages(
        &self,
        _channel: &ChannelHandle,
        limit: usize,
    ) -> Result<Vec<RawMessage>, ChannelClientError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.batch_fails {
            return Err(ChannelClientError::Unavailable("flood wait".to_string()));
        }
        Ok(self.messages.iter().take(limit).cloned().collect())
    }

    async fn fetch_discussion_thread(
        &self,
        _channel: &ChannelHandle,
        message_id: i64,
    ) -> Result<Option<ThreadMetadata>, ChannelClientError> {
        if self.stalls_once == Some(message_id) && !self.stalled.swap(true, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.failing_counts.contains(&message_id) {
            return Err(ChannelClientError::Unavailable("thread lookup timed out".to_string()));
        }
        Ok(self.threads.get(&message_id).cloned())
    }

    async fn fetch_replies(
        &self,
        _channel: &ChannelHandle,
        message_id: i64,
        limit: usize,
    ) -> Result<Vec<String>, ChannelClientError> {
        if self.failing_replies.contains(&message_id) {
            return Err(ChannelClientError::Unavailable("replies unavailable".to_string()));
        }
        Ok(self
            .replies
            .get(&message_id)
            .map(|r| r.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

fn message(id: i64, text: &str) -> RawMessage {
    RawMessage {
        id,
        text: Some(text.to_string()),
        date: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        views: Some(100),
        ..RawMessage::default()
    }
}

fn collector(fake: FakeChannel) -> (Arc<FakeChannel>, ChannelCollector<FakeChannel>) {
    let client = Arc::new(fake);
    let collector = ChannelCollector::new(Arc::clone(&client), CollectorConfig::default());
    (client, collector)
}

#[tokio::test]
async fn empty_text_messages_do_not_consume_sequence_index() {
    let (_, mut collector) = collector(FakeChannel::with_messages(vec![
        message(3, "first post"),
        message(2, ""),
        message(1, "third post"),
    ]));

    let records = collector.collect("chan", 10).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].sequence_index, 1);
    assert_eq!(records[1].sequence_index, 2);
    assert_eq!(records[0].source_id, 3);
    assert_eq!(records[1].source_id, 1);
}

#[tokio::test]
async fn count_failure_keeps_retrieved_texts() {
    let mut fake = FakeChannel::with_messages(vec![message(7, "hello")]);
    fake.failing_counts = vec![7];
    fake.replies
        .insert(7, vec!["nice".to_string(), "great".to_string()]);
    let (_, mut collector) = collector(fake);

    let records = collector.collect("chan", 10).await.unwrap();

    let record = &records[0];
    assert_eq!(record.counters.comment_count, 0);
    assert_eq!(record.comment_texts, vec!["nice", "great"]);
    assert!(record.derived.engagement_rate_percent.abs() < f64::EPSILON);
    assert_eq!(collector.state(), RunState::Complete);
}

#[tokio::test]
async fn reply_failure_keeps_comment_count() {
    let mut fake = FakeChannel::with_messages(vec![message(7, "hello")]);
    fake.failing_replies = vec![7];
    fake.threads.insert(
        7,
        ThreadMetadata {
            replies_count: Some(4),
            ..ThreadMetadata::default()
        },
    );
    let (_, mut collector) = collector(fake);

    let records = collector.collect("chan", 10).await.unwrap();

    assert_eq!(records[0].counters.comment_count, 4);
    assert!(records[0].comment_texts.is_empty());
    // 4 comments / 100 views
    assert!((records[0].derived.engagement_rate_percent - 4.0).abs() < 1e-9);
}

#[tokio::test]
async fn zero_views_caps_engagement_at_hundred() {
    let mut msg = message(1, "popular");
    msg.views = Some(0);
    msg.reactions = Some(vec![Reaction {
        emoji: None,
        count: 5,
    }]);
    let (_, mut collector) = collector(FakeChannel::with_messages(vec![msg]));

    let records = collector.collect("chan", 10).await.unwrap();

    assert!((records[0].derived.engagement_rate_percent - 100.0).abs() < f64::EPSILON);
    assert_eq!(records[0].derived.unique_views, 0);
}

#[tokio::test]
async fn sentiment_scores_message_text() {
    let (_, mut collector) = collector(FakeChannel::with_messages(vec![
        message(2, "Спасибо, всё отлично"),
        message(1, "Neutral update"),
    ]));

    let records = collector.collect("chan", 10).await.unwrap();

    assert!((records[0].derived.sentiment - 0.7).abs() < 1e-9);
    assert!((records[1].derived.sentiment - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn comment_texts_are_capped_per_post() {
    let mut fake = FakeChannel::with_messages(vec![message(1, "busy thread")]);
    fake.replies
        .insert(1, (0..25).map(|i| format!("reply {i}")).collect());
    let client = Arc::new(fake);
    let config = CollectorConfig {
        comment_cap: 3,
        ..CollectorConfig::default()
    };
    let mut collector = ChannelCollector::new(client, config);

    let records = collector.collect("chan", 10).await.unwrap();

    assert_eq!(records[0].comment_texts.len(), 3);
}

#[tokio::test]
async fn unresolvable_channel_is_reported() {
    let fake = FakeChannel {
        unresolvable: true,
        ..FakeChannel::default()
    };
    let (client, mut collector) = collector(fake);

    let err = collector.collect("missing", 10).await.unwrap_err();

    assert!(matches!(err, CollectError::ChannelResolution { ref channel, .. } if channel == "missing"));
    assert_eq!(collector.state(), RunState::Complete);
    assert!(collector.records().is_empty());
    assert_eq!(client.lifecycle(), vec!["connect", "disconnect"]);
}

#[tokio::test]
async fn connect_failure_leaves_collector_idle() {
    let fake = FakeChannel {
        connect_fails: true,
        ..FakeChannel::with_messages(vec![message(1, "a")])
    };
    let (client, mut collector) = collector(fake);

    let err = collector.collect("chan", 10).await.unwrap_err();

    assert!(matches!(err, CollectError::Connect { .. }), "got {err:?}");
    assert_eq!(collector.state(), RunState::Idle);
    assert!(collector.collection_timestamp().is_none());
    assert!(collector.records().is_empty());
    assert_eq!(client.fetch_calls.load(Ordering::SeqCst), 0);
    assert_eq!(client.lifecycle(), vec!["connect"]);
}

#[tokio::test]
async fn abandoned_run_is_discarded_and_next_collect_starts_over() {
    let fake = FakeChannel {
        stalls_once: Some(1),
        ..FakeChannel::with_messages(vec![
            message(3, "first"),
            message(2, ""),
            message(1, "second"),
        ])
    };
    let (client, mut collector) = collector(fake);

    let outcome = tokio::time::timeout(Duration::from_millis(100), collector.collect("chan", 10)).await;
    assert!(outcome.is_err(), "run should still be in flight");

    assert_eq!(collector.state(), RunState::Collecting);
    assert!(collector.records().is_empty());
    assert!(collector.summary().is_empty());
    assert_eq!(collector.to_csv(), "");
    assert_eq!(client.lifecycle(), vec!["connect"]);

    let records = collector.collect("chan", 10).await.unwrap();

    let indices: Vec<usize> = records.iter().map(|r| r.sequence_index).collect();
    let ids: Vec<i64> = records.iter().map(|r| r.source_id).collect();
    assert_eq!(indices, vec![1, 2]);
    assert_eq!(ids, vec![3, 1]);
    assert_eq!(collector.state(), RunState::Complete);
    assert_eq!(client.fetch_calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        client.lifecycle(),
        vec!["connect", "disconnect", "connect", "disconnect"]
    );
}

#[tokio::test]
async fn batch_failure_is_reported_distinct_from_empty_result() {
    let fake = FakeChannel {
        batch_fails: true,
        ..FakeChannel::default()
    };
    let (_, mut collector) = collector(fake);

    let err = collector.collect("chan", 10).await.unwrap_err();

    assert!(matches!(err, CollectError::BatchFetch { .. }));
    assert_eq!(collector.state(), RunState::Complete);
    assert!(collector.summary().is_empty());
}

#[tokio::test]
async fn repeated_collect_returns_cached_dataset() {
    let (client, mut collector) = collector(FakeChannel::with_messages(vec![
        message(2, "a"),
        message(1, "b"),
    ]));

    let first = collector.collect("chan", 10).await.unwrap().to_vec();
    let second = collector.collect("chan", 10).await.unwrap().to_vec();

    assert_eq!(first, second);
    assert_eq!(client.fetch_calls.load(Ordering::SeqCst), 1);
    assert_eq!(client.lifecycle(), vec!["connect", "disconnect"]);
}

#[tokio::test]
async fn reset_clears_state_and_allows_refetch() {
    let (client, mut collector) = collector(FakeChannel::with_messages(vec![message(1, "a")]));

    collector.collect("chan", 10).await.unwrap();
    assert!(collector.collection_timestamp().is_some());

    collector.reset();
    assert_eq!(collector.state(), RunState::Idle);
    assert!(collector.records().is_empty());
    assert!(collector.collection_timestamp().is_none());

    collector.collect("chan", 10).await.unwrap();
    assert_eq!(client.fetch_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn limit_bounds_fetched_messages() {
    let messages = (1..=20).map(|i| message(i, "post")).collect();
    let (_, mut collector) = collector(FakeChannel::with_messages(messages));

    let records = collector.collect("chan", 5).await.unwrap();

    assert_eq!(records.len(), 5);
}

/// Source that ignores the requested limit and returns its whole backlog.
struct OversharingChannel(FakeChannel);

#[async_trait]
impl ChannelClient for OversharingChannel {
    async fn connect(&self) -> Result<(), ChannelClientError> {
        self.0.connect().await
    }

    async fn disconnect(&self) -> Result<(), ChannelClientError> {
        self.0.disconnect().await
    }

    async fn resolve_channel(&self, identifier: &str) -> Result<ChannelHandle, ChannelClientError> {
        self.0.resolve_channel(identifier).await
    }

    async fn fetch_messages(
        &self,
        channel: &ChannelHandle,
        _limit: usize,
    ) -> Result<Vec<RawMessage>, ChannelClientError> {
        self.0.fetch_messages(channel, usize::MAX).await
    }

    async fn fetch_discussion_thread(
        &self,
        channel: &ChannelHandle,
        message_id: i64,
    ) -> Result<Option<ThreadMetadata>, ChannelClientError> {
        self.0.fetch_discussion_thread(channel, message_id).await
    }

    async fn fetch_replies(
        &self,
        channel: &ChannelHandle,
        message_id: i64,
        limit: usize,
    ) -> Result<Vec<String>, ChannelClientError> {
        self.0.fetch_replies(channel, message_id, limit).await
    }
}

#[tokio::test]
async fn limit_holds_even_when_source_returns_more() {
    let messages = (1..=20).map(|i| message(i, "post")).collect();
    let client = Arc::new(OversharingChannel(FakeChannel::with_messages(messages)));
    let mut collector = ChannelCollector::new(client, CollectorConfig::default());

    let records = collector.collect("chan", 5).await.unwrap();

    assert_eq!(records.len(), 5);
    assert_eq!(records[4].source_id, 5);
}

#[tokio::test]
async fn summary_and_export_reflect_collected_records() {
    let mut fake = FakeChannel::with_messages(vec![message(2, "one #tag"), message(1, "two")]);
    fake.threads.insert(
        2,
        ThreadMetadata {
            replies_count: Some(3),
            ..ThreadMetadata::default()
        },
    );
    fake.replies.insert(2, vec!["  hi  ".to_string()]);
    let (_, mut collector) = collector(fake);
    collector.collect("chan", 10).await.unwrap();

    let summary = collector.summary();
    assert_eq!(summary.total_posts, 2);
    assert_eq!(summary.total_comments, 3);
    assert_eq!(summary.total_views, 200);
    assert_eq!(summary.posts_with_comments, 1);
    assert!(summary.collection_time.is_some());

    let csv = collector.to_csv();
    let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], CSV_HEADERS.join(","));
    assert!(lines[1].ends_with(",1,\"\"\"hi\"\"\""), "row was {}", lines[1]);

    let digest = collector.comments_digest().unwrap();
    assert_eq!(digest.sample_comments, vec!["hi"]);

    let bundle = collector.export_bundle("chan");
    assert_eq!(bundle.filename, "telegram_stats_chan.csv");
    assert_eq!(bundle.csv, csv);
}
