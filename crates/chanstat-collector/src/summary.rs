//! Channel-level reductions over collected records.

use chanstat_core::{ChannelSummary, ContentRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Number of comment texts included in [`CommentsDigest::sample_comments`].
const SAMPLE_COMMENTS: usize = 10;

/// Reduce `records` into channel totals.
///
/// `avg_engagement` is `total_likes / total_views * 100`, a ratio of totals,
/// not a mean of per-record engagement rates. Empty input yields an all-zero
/// summary with no collection time.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(
    records: &[ContentRecord],
    collection_timestamp: Option<DateTime<Utc>>,
) -> ChannelSummary {
    if records.is_empty() {
        return ChannelSummary::default();
    }

    let total_comments = saturating_total(records, |r| r.counters.comment_count);
    let total_views = saturating_total(records, |r| r.counters.views);
    let total_likes = saturating_total(records, |r| r.counters.likes);

    let avg_engagement = if total_views > 0 {
        total_likes as f64 / total_views as f64 * 100.0
    } else {
        0.0
    };

    ChannelSummary {
        total_posts: records.len(),
        total_comments,
        total_views,
        total_likes,
        avg_engagement,
        posts_with_comments: records.iter().filter(|r| r.has_comments()).count(),
        collection_time: collection_timestamp
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
    }
}

fn saturating_total(records: &[ContentRecord], field: impl Fn(&ContentRecord) -> u64) -> u64 {
    records
        .iter()
        .map(field)
        .fold(0, u64::saturating_add)
}

/// Overview of the reply texts that were actually retrieved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentsDigest {
    pub total_comment_texts: usize,
    /// Posts with at least one retrieved text.
    pub posts_with_comments: usize,
    pub avg_comments_per_post: f64,
    pub sample_comments: Vec<String>,
}

/// Summarise retrieved comment texts. `None` when there are no records.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn comments_digest(records: &[ContentRecord]) -> Option<CommentsDigest> {
    if records.is_empty() {
        return None;
    }

    let with_texts: Vec<&ContentRecord> = records
        .iter()
        .filter(|r| !r.comment_texts.is_empty())
        .collect();
    let total_comment_texts: usize = with_texts.iter().map(|r| r.comment_texts.len()).sum();
    let posts_with_comments = with_texts.len();

    let avg_comments_per_post = if posts_with_comments > 0 {
        total_comment_texts as f64 / posts_with_comments as f64
    } else {
        0.0
    };

    let sample_comments = with_texts
        .iter()
        .flat_map(|r| r.comment_texts.iter().cloned())
        .take(SAMPLE_COMMENTS)
        .collect();

    Some(CommentsDigest {
        total_comment_texts,
        posts_with_comments,
        avg_comments_per_post,
        sample_comments,
    })
}

#[cfg(test)]
mod tests {
    use chanstat_core::{ContentType, Counters, DerivedMetrics, Platform};
    use chrono::TimeZone;

    use super::*;

    fn record(likes: u64, views: u64, comments: u64, texts: &[&str]) -> ContentRecord {
        ContentRecord {
            sequence_index: 1,
            source_id: 1,
            title: "t".to_string(),
            url: "https://t.me/c/1".to_string(),
            content_type: ContentType::Article,
            platform: Platform::Telegram,
            published_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            counters: Counters {
                likes,
                shares: 0,
                views,
                comment_count: comments,
            },
            tags: vec![],
            derived: DerivedMetrics::default(),
            comment_texts: texts.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    #[test]
    fn empty_records_give_zero_summary_without_time() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let summary = summarize(&[], Some(ts));
        assert_eq!(summary, ChannelSummary::default());
        assert!(summary.collection_time.is_none());
    }

    #[test]
    fn totals_are_sums() {
        let records = vec![record(10, 100, 2, &[]), record(30, 300, 0, &[])];
        let summary = summarize(&records, None);
        assert_eq!(summary.total_posts, 2);
        assert_eq!(summary.total_likes, 40);
        assert_eq!(summary.total_views, 400);
        assert_eq!(summary.total_comments, 2);
        assert_eq!(summary.posts_with_comments, 1);
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let records = vec![record(u64::MAX, u64::MAX, 1, &[]), record(5, 5, u64::MAX, &[])];
        let summary = summarize(&records, None);
        assert_eq!(summary.total_likes, u64::MAX);
        assert_eq!(summary.total_views, u64::MAX);
        assert_eq!(summary.total_comments, u64::MAX);
    }

    #[test]
    fn avg_engagement_is_ratio_of_totals() {
        // Per-record rates are 50 % and 1 %; their mean would be 25.5 %.
        let records = vec![record(5, 10, 0, &[]), record(10, 1000, 0, &[])];
        let summary = summarize(&records, None);
        let expected = 15.0 / 1010.0 * 100.0;
        assert!((summary.avg_engagement - expected).abs() < 1e-9);
    }

    #[test]
    fn avg_engagement_zero_without_views() {
        let summary = summarize(&[record(5, 0, 0, &[])], None);
        assert!(summary.avg_engagement.abs() < f64::EPSILON);
    }

    #[test]
    fn collection_time_is_iso8601() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let summary = summarize(&[record(1, 1, 0, &[])], Some(ts));
        assert_eq!(summary.collection_time.as_deref(), Some("2024-05-01T12:00:00Z"));
    }

    #[test]
    fn digest_none_for_empty_records() {
        assert!(comments_digest(&[]).is_none());
    }

    #[test]
    fn digest_counts_retrieved_texts() {
        let records = vec![
            record(0, 0, 3, &["a", "b"]),
            record(0, 0, 0, &[]),
            record(0, 0, 1, &["c", "d", "e", "f"]),
        ];
        let digest = comments_digest(&records).unwrap();
        assert_eq!(digest.total_comment_texts, 6);
        assert_eq!(digest.posts_with_comments, 2);
        assert!((digest.avg_comments_per_post - 3.0).abs() < f64::EPSILON);
        assert_eq!(digest.sample_comments, vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn digest_sample_is_capped() {
        let texts: Vec<String> = (0..15).map(|i| format!("c{i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let digest = comments_digest(&[record(0, 0, 15, &refs)]).unwrap();
        assert_eq!(digest.sample_comments.len(), 10);
        assert_eq!(digest.total_comment_texts, 15);
    }
}
