//! Pure per-message extraction: classification, title, tags and base counters.

use std::sync::LazyLock;

use chanstat_core::{ContentRecord, ContentType, Counters, DerivedMetrics, Platform};
use chrono::{DateTime, Utc};
use regex::Regex;

use crate::client::{ChannelHandle, Media, RawMessage};

/// Longest title, in characters, before truncation.
pub const TITLE_MAX_CHARS: usize = 50;

const TRUNCATION_MARKER: &str = "...";

/// Substrings that mark a text-only post as interactive (polls, quizzes).
const INTERACTIVE_KEYWORDS: &[&str] = &["опрос", "опросы", "poll", "quiz"];

static HASHTAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\w+").expect("valid hashtag regex"));

/// The fields of a [`ContentRecord`] that come straight from the message.
///
/// `counters.comment_count` is left at zero; the comment resolver fills it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPost {
    pub sequence_index: usize,
    pub source_id: i64,
    pub title: String,
    pub url: String,
    pub content_type: ContentType,
    pub platform: Platform,
    pub published_at: DateTime<Utc>,
    pub counters: Counters,
    pub tags: Vec<String>,
}

impl ExtractedPost {
    /// Combine with comment data and derived metrics into the final record.
    #[must_use]
    pub fn into_record(
        self,
        comment_count: u64,
        comment_texts: Vec<String>,
        derived: DerivedMetrics,
    ) -> ContentRecord {
        ContentRecord {
            sequence_index: self.sequence_index,
            source_id: self.source_id,
            title: self.title,
            url: self.url,
            content_type: self.content_type,
            platform: self.platform,
            published_at: self.published_at,
            counters: Counters {
                comment_count,
                ..self.counters
            },
            tags: self.tags,
            derived,
            comment_texts,
        }
    }
}

/// Extract base fields for one message. Never fails: missing fields become
/// zero or empty.
#[must_use]
pub fn extract_post(
    message: &RawMessage,
    channel: &ChannelHandle,
    platform: Platform,
    sequence_index: usize,
) -> ExtractedPost {
    ExtractedPost {
        sequence_index,
        source_id: message.id,
        title: extract_title(message),
        url: post_url(channel, message.id),
        content_type: classify_content(message),
        platform,
        published_at: message.date,
        counters: base_counters(message),
        tags: extract_tags(message.body()),
    }
}

/// Media always wins over text: photo → post, video document → video,
/// any other document → post. Without such media, poll/quiz keywords mark
/// a post; everything else is an article.
#[must_use]
pub fn classify_content(message: &RawMessage) -> ContentType {
    match &message.media {
        Some(Media::Photo) => return ContentType::Post,
        Some(Media::Document { mime_type }) => {
            return if mime_type.starts_with("video/") {
                ContentType::Video
            } else {
                ContentType::Post
            };
        }
        Some(Media::Other) | None => {}
    }

    let text = message.body().to_lowercase();
    if INTERACTIVE_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        ContentType::Post
    } else {
        ContentType::Article
    }
}

/// First line of the message, cut to [`TITLE_MAX_CHARS`] characters plus
/// `...` when longer. Text-less messages get `Message {id}`.
#[must_use]
pub fn extract_title(message: &RawMessage) -> String {
    let text = message.body();
    if text.is_empty() {
        return format!("Message {}", message.id);
    }

    let first_line = text.split('\n').next().unwrap_or_default();
    if first_line.chars().count() > TITLE_MAX_CHARS {
        let mut title: String = first_line.chars().take(TITLE_MAX_CHARS).collect();
        title.push_str(TRUNCATION_MARKER);
        title
    } else {
        first_line.to_string()
    }
}

/// Every `#word` token in order of appearance. Repeats are kept.
#[must_use]
pub fn extract_tags(text: &str) -> Vec<String> {
    HASHTAG_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn base_counters(message: &RawMessage) -> Counters {
    let likes = message
        .reactions
        .as_ref()
        .map_or(0, |reactions| reactions.iter().map(|r| r.count).sum());

    Counters {
        likes,
        shares: message.forwards.unwrap_or(0),
        views: message.views.unwrap_or(0),
        comment_count: 0,
    }
}

fn post_url(channel: &ChannelHandle, message_id: i64) -> String {
    format!("https://t.me/{}/{message_id}", channel.username)
}
