//! Tabular (CSV) export and header-friendly summary bundle.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use chanstat_core::{ChannelSummary, ContentRecord};
use chrono::{DateTime, Utc};

use crate::error::ExportError;
use crate::summary::summarize;

/// Column headers, in output order.
pub const CSV_HEADERS: [&str; 12] = [
    "Title",
    "URL",
    "Content Type",
    "Platform",
    "Published At",
    "Likes",
    "Shares",
    "Comments Count",
    "Views",
    "Tags",
    "Comments Retrieved",
    "Comment Texts",
];

const LINE_END: &str = "\r\n";
const COMMENT_SEPARATOR: &str = " | ";
const PUBLISHED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render records as CSV: one header row, one row per record.
///
/// Returns an empty string (no header) for an empty slice.
#[must_use]
pub fn to_csv(records: &[ContentRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    push_row(&mut out, CSV_HEADERS.iter().map(|h| Cow::Borrowed(*h)));
    for record in records {
        push_row(&mut out, record_cells(record).into_iter());
    }
    out
}

fn record_cells(record: &ContentRecord) -> Vec<Cow<'_, str>> {
    vec![
        Cow::Borrowed(record.title.as_str()),
        Cow::Borrowed(record.url.as_str()),
        Cow::Borrowed(record.content_type.as_str()),
        Cow::Borrowed(record.platform.as_str()),
        Cow::Owned(record.published_at.format(PUBLISHED_AT_FORMAT).to_string()),
        Cow::Owned(record.counters.likes.to_string()),
        Cow::Owned(record.counters.shares.to_string()),
        Cow::Owned(record.counters.comment_count.to_string()),
        Cow::Owned(record.counters.views.to_string()),
        Cow::Owned(record.tags_str()),
        Cow::Owned(record.texts_retrieved().to_string()),
        Cow::Owned(join_comment_texts(&record.comment_texts)),
    ]
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = Cow<'a, str>>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(&cell));
    }
    out.push_str(LINE_END);
}

/// Quote a field when it holds a delimiter, quote or line break; embedded
/// quotes are doubled.
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Each text wrapped in quotes and joined with ` | `. A literal `|` or `\`
/// inside a text is backslash-escaped so the separator stays unambiguous.
fn join_comment_texts(texts: &[String]) -> String {
    texts
        .iter()
        .map(|text| format!("\"{}\"", text.replace('\\', "\\\\").replace('|', "\\|")))
        .collect::<Vec<_>>()
        .join(COMMENT_SEPARATOR)
}

/// `telegram_stats_YYYYMMDD_HHMMSS.csv`, stamped with the collection time or now.
#[must_use]
pub fn default_filename(collection_timestamp: Option<DateTime<Utc>>) -> String {
    let ts = collection_timestamp.unwrap_or_else(Utc::now);
    format!("telegram_stats_{}.csv", ts.format("%Y%m%d_%H%M%S"))
}

/// Write the CSV export to `path`, or to [`default_filename`] inside `dir`
/// when `path` is `None`.
///
/// Returns `Ok(None)` without touching the filesystem when there is nothing
/// to export.
///
/// # Errors
///
/// Returns [`ExportError::Io`] if the file cannot be written.
pub async fn export_to_file(
    records: &[ContentRecord],
    dir: &Path,
    path: Option<&Path>,
    collection_timestamp: Option<DateTime<Utc>>,
) -> Result<Option<PathBuf>, ExportError> {
    if records.is_empty() {
        tracing::info!("no records to export");
        return Ok(None);
    }

    let target = path.map_or_else(
        || dir.join(default_filename(collection_timestamp)),
        Path::to_path_buf,
    );
    tokio::fs::write(&target, to_csv(records)).await?;
    tracing::info!(path = %target.display(), records = records.len(), "exported CSV");
    Ok(Some(target))
}

/// CSV download plus the summary values sent alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBundle {
    pub filename: String,
    pub csv: String,
    pub summary: ChannelSummary,
}

impl ExportBundle {
    #[must_use]
    pub fn new(
        channel: &str,
        records: &[ContentRecord],
        collection_timestamp: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            filename: format!("telegram_stats_{}.csv", header_safe(channel)),
            csv: to_csv(records),
            summary: summarize(records, collection_timestamp),
        }
    }

    /// Header name/value pairs for transport; counts are string-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Json`] if the summary cannot be encoded.
    pub fn headers(&self) -> Result<Vec<(&'static str, String)>, ExportError> {
        Ok(vec![
            (
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", self.filename),
            ),
            ("X-Stats-Summary", serde_json::to_string(&self.summary)?),
            ("X-Total-Posts", self.summary.total_posts.to_string()),
            ("X-Total-Comments", self.summary.total_comments.to_string()),
        ])
    }
}

/// `channel` with quotes and control characters removed, so it can sit
/// inside a quoted header parameter.
fn header_safe(channel: &str) -> String {
    channel
        .chars()
        .filter(|c| *c != '"' && !c.is_control())
        .collect()
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
