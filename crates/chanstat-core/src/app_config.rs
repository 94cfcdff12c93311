#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Base URL of the channel bridge API.
    pub channel_api_url: String,
    pub channel_api_token: Option<String>,
    /// Channel collected when the caller passes a blank identifier.
    pub default_channel: Option<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Retries apply to channel resolution and batch fetch only.
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Upper bound on a single back-off delay.
    pub retry_max_delay_ms: u64,
    pub collect_limit: usize,
    pub comment_cap: usize,
    pub model_api_url: Option<String>,
    pub model_api_key: Option<String>,
    pub model_name: String,
    pub model_temperature: f32,
}

impl AppConfig {
    /// Resolve a caller-supplied channel identifier, falling back to
    /// [`AppConfig::default_channel`] when it is absent or blank.
    #[must_use]
    pub fn channel_or_default<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        match requested.map(str::trim) {
            Some(channel) if !channel.is_empty() => Some(channel),
            _ => self.default_channel.as_deref(),
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("channel_api_url", &self.channel_api_url)
            .field(
                "channel_api_token",
                &self.channel_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("default_channel", &self.default_channel)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("retry_max_delay_ms", &self.retry_max_delay_ms)
            .field("collect_limit", &self.collect_limit)
            .field("comment_cap", &self.comment_cap)
            .field("model_api_url", &self.model_api_url)
            .field(
                "model_api_key",
                &self.model_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("model_name", &self.model_name)
            .field("model_temperature", &self.model_temperature)
            .finish()
    }
}
