use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat completion API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("invalid model API base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// `MODEL_API_URL` is unset.
    #[error("model API is not configured (set MODEL_API_URL)")]
    NotConfigured,

    #[error("chat completion returned no content")]
    EmptyResponse,

    /// The model answered, but no JSON payload could be recovered from it.
    #[error("no structured payload in model response: {excerpt}")]
    NoStructuredPayload { excerpt: String },

    #[error("structured payload for {context} has unexpected shape: {source}")]
    UnexpectedShape {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("post not found at index {index} ({available} collected)")]
    PostNotFound { index: usize, available: usize },

    #[error("nothing to analyze: {0}")]
    EmptyInput(&'static str),
}
