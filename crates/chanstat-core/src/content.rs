use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse classification of a collected post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,
    Video,
    Post,
}

impl ContentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Video => "video",
            ContentType::Post => "post",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform a record was collected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Vk,
    Telegram,
    Youtube,
}

impl Platform {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Vk => "vk",
            Platform::Telegram => "telegram",
            Platform::Youtube => "youtube",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base engagement counters read straight off a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    /// Sum of all reaction counts.
    pub likes: u64,
    /// Forward count.
    pub shares: u64,
    pub views: u64,
    pub comment_count: u64,
}

/// Metrics computed from the counters and the message text.
///
/// `saves`, `avg_watch_time_sec`, `completion_rate_percent` and
/// `click_through_rate_percent` are not exposed by channel platforms and are
/// always zero: "not applicable", not "missing".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// In `[0, 100]`.
    pub engagement_rate_percent: f64,
    /// In `[0.0, 1.0]`, 0.5 is neutral.
    pub sentiment: f64,
    pub unique_views: u64,
    pub saves: u64,
    pub avg_watch_time_sec: f64,
    pub completion_rate_percent: f64,
    pub click_through_rate_percent: f64,
}

impl DerivedMetrics {
    #[must_use]
    pub fn new(engagement_rate_percent: f64, sentiment: f64, unique_views: u64) -> Self {
        Self {
            engagement_rate_percent,
            sentiment,
            unique_views,
            ..Self::default()
        }
    }
}

/// One processed channel post with its extracted and derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// 1-based position within the collection run that produced it.
    pub sequence_index: usize,
    /// The channel's native message id.
    pub source_id: i64,
    pub title: String,
    pub url: String,
    pub content_type: ContentType,
    pub platform: Platform,
    pub published_at: DateTime<Utc>,
    pub counters: Counters,
    /// Hashtags in order of appearance, duplicates preserved.
    pub tags: Vec<String>,
    pub derived: DerivedMetrics,
    /// Up to the configured cap of retrieved reply texts.
    pub comment_texts: Vec<String>,
}

impl ContentRecord {
    /// Tags joined with `,`, the form used by the tabular export.
    #[must_use]
    pub fn tags_str(&self) -> String {
        self.tags.join(",")
    }

    #[must_use]
    pub fn has_comments(&self) -> bool {
        self.counters.comment_count > 0
    }

    #[must_use]
    pub fn texts_retrieved(&self) -> usize {
        self.comment_texts.len()
    }
}

/// Channel-level totals derived from a set of records.
///
/// Recomputed on every request; never cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub total_posts: usize,
    pub total_comments: u64,
    pub total_views: u64,
    pub total_likes: u64,
    /// `total_likes / total_views * 100`, or 0 when there are no views.
    pub avg_engagement: f64,
    pub posts_with_comments: usize,
    /// ISO-8601 collection start, absent if no run has happened.
    pub collection_time: Option<String>,
}

impl ChannelSummary {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_posts == 0
    }
}
