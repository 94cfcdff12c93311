use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a
/// plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let channel_api_url = require("CHANSTAT_CHANNEL_API_URL")?;
    let channel_api_token = optional("CHANSTAT_CHANNEL_API_TOKEN");
    let default_channel = optional("CHANSTAT_DEFAULT_CHANNEL");

    let env = parse_environment(&or_default("CHANSTAT_ENV", "development"))?;
    let log_level = or_default("CHANSTAT_LOG_LEVEL", "info");

    let request_timeout_secs = parse_var(&lookup, "CHANSTAT_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("CHANSTAT_USER_AGENT", "chanstat/0.1 (channel-statistics)");
    let max_retries = parse_var(&lookup, "CHANSTAT_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_var(&lookup, "CHANSTAT_RETRY_BACKOFF_BASE_MS", "500")?;
    let retry_max_delay_ms = parse_var(&lookup, "CHANSTAT_RETRY_MAX_DELAY_MS", "30000")?;

    let collect_limit: usize = parse_var(&lookup, "CHANSTAT_COLLECT_LIMIT", "100")?;
    if collect_limit == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "CHANSTAT_COLLECT_LIMIT".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let comment_cap = parse_var(&lookup, "CHANSTAT_COMMENT_CAP", "10")?;

    let model_api_url = optional("MODEL_API_URL");
    let model_api_key = optional("MODEL_API_KEY");
    let model_name = or_default("MODEL_NAME", "x-ai/grok-4.1-fast:free");
    let model_temperature = parse_var(&lookup, "MODEL_TEMPERATURE", "0.2")?;

    Ok(AppConfig {
        env,
        log_level,
        channel_api_url,
        channel_api_token,
        default_channel,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        retry_max_delay_ms,
        collect_limit,
        comment_cap,
        model_api_url,
        model_api_key,
        model_name,
        model_temperature,
    })
}

/// Read `var` (or `default` when unset) and parse it as `T`.
fn parse_var<F, T>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CHANSTAT_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
