//! Channel statistics pipeline.
//!
//! Fetches a bounded window of channel posts through a [`ChannelClient`],
//! classifies and scores each one, resolves its discussion thread, and keeps
//! the resulting [`ContentRecord`](chanstat_core::ContentRecord)s in memory
//! for summary and tabular export. Failures scoped to one post degrade to
//! zero/empty values; only channel resolution and batch fetch failures are
//! surfaced as [`CollectError`].

pub mod client;
pub mod collector;
pub mod comments;
pub mod error;
pub mod export;
pub mod metrics;
pub mod outcome;
pub mod scorer;
pub mod summary;

pub use client::http::HttpChannelClient;
pub use client::{ChannelClient, ChannelHandle, Media, RawMessage, Reaction, ThreadMetadata};
pub use collector::{ChannelCollector, CollectorConfig, RunState};
pub use comments::{CommentData, CommentResolver};
pub use error::{ChannelClientError, CollectError, ExportError};
pub use export::{export_to_file, to_csv, ExportBundle, CSV_HEADERS};
pub use metrics::{classify_content, extract_post, extract_tags, extract_title, ExtractedPost};
pub use outcome::Outcome;
pub use scorer::{engagement_rate, engagement_rate_outcome, SentimentLexicon};
pub use summary::{comments_digest, summarize, CommentsDigest};
