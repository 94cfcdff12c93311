use thiserror::Error;

/// Errors raised by a [`ChannelClient`](crate::ChannelClient) implementation.
#[derive(Debug, Error)]
pub enum ChannelClientError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid channel API base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Catch-all for adapters that are not HTTP-backed.
    #[error("channel source unavailable: {0}")]
    Unavailable(String),
}

/// Run-level failures. Anything scoped to a single post is absorbed as an
/// [`Outcome::Degraded`](crate::Outcome::Degraded) instead.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to connect to channel source: {source}")]
    Connect { source: ChannelClientError },

    #[error("could not resolve channel '{channel}': {source}")]
    ChannelResolution {
        channel: String,
        source: ChannelClientError,
    },

    #[error("failed to fetch messages for channel '{channel}': {source}")]
    BatchFetch {
        channel: String,
        source: ChannelClientError,
    },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error writing export: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode summary: {0}")]
    Json(#[from] serde_json::Error),
}
