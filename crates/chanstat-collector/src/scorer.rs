//! Engagement rate and keyword sentiment heuristics.
//!
//! Neither score is a model. Engagement is interactions per view, capped at
//! 100 %. Sentiment starts neutral at 0.5 and moves by a fixed step for every
//! keyword present in the text.

use chanstat_core::Counters;

use crate::outcome::Outcome;

/// Neutral sentiment.
pub const SENTIMENT_BASE: f64 = 0.5;

const POSITIVE_KEYWORDS: &[(&str, f64)] = &[
    ("отлично", 0.1),
    ("прекрасно", 0.1),
    ("супер", 0.1),
    ("спасибо", 0.1),
    ("хорошо", 0.1),
];

const NEGATIVE_KEYWORDS: &[(&str, f64)] = &[
    ("плохо", -0.1),
    ("ужасно", -0.1),
    ("кошмар", -0.1),
    ("разочарован", -0.1),
];

/// `(likes + shares + comments) / max(views, 1) * 100`, clamped to `[0, 100]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn engagement_rate(counters: &Counters) -> f64 {
    let interactions = counters
        .likes
        .saturating_add(counters.shares)
        .saturating_add(counters.comment_count);
    let views = counters.views.max(1);
    let rate = interactions as f64 / views as f64 * 100.0;
    rate.clamp(0.0, 100.0)
}

/// Engagement rate that degrades to `0.0` when the comment count it depends
/// on could not be fetched.
#[must_use]
pub fn engagement_rate_outcome(base: &Counters, comment_count: &Outcome<u64>) -> Outcome<f64> {
    match comment_count {
        Outcome::Value(count) => Outcome::Value(engagement_rate(&Counters {
            comment_count: *count,
            ..*base
        })),
        Outcome::Degraded { reason, .. } => Outcome::Degraded {
            fallback: 0.0,
            reason: format!("comment count unavailable: {reason}"),
        },
    }
}

/// Keyword weights for the sentiment heuristic.
///
/// Each keyword counts at most once per text, matched as a substring of the
/// lower-cased text.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentLexicon {
    pub base: f64,
    /// Keys are lowercase. Positive weights raise the score, negative lower it.
    pub weights: Vec<(String, f64)>,
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        Self {
            base: SENTIMENT_BASE,
            weights: POSITIVE_KEYWORDS
                .iter()
                .chain(NEGATIVE_KEYWORDS)
                .map(|&(word, weight)| (word.to_string(), weight))
                .collect(),
        }
    }
}

impl SentimentLexicon {
    /// Score `text` into `[0.0, 1.0]`. Text without keywords scores exactly
    /// [`SentimentLexicon::base`].
    #[must_use]
    pub fn score(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let mut score = self.base;
        for (word, weight) in &self.weights {
            if lowered.contains(word.as_str()) {
                score += weight;
            }
        }
        score.clamp(0.0, 1.0)
    }
}
