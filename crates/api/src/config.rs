use std::str::FromStr;

use axum::http::HeaderValue;
use kapruka_events::NotificationPolicy;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<HeaderValue>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Foreground presentation flags installed at startup.
    pub notification_policy: NotificationPolicy,
    /// When set, alerts are POSTed here instead of being presented locally.
    pub notification_webhook_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `HOST`                     | `0.0.0.0`               |
    /// | `PORT`                     | `3000`                  |
    /// | `CORS_ORIGINS`             | `http://localhost:8081` |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                    |
    /// | `NOTIFY_SHOW_ALERT`        | `true`                  |
    /// | `NOTIFY_PLAY_SOUND`        | `true`                  |
    /// | `NOTIFY_SET_BADGE`         | `false`                 |
    /// | `NOTIFICATION_WEBHOOK_URL` | unset                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = env_or("PORT", 3000_u16)?;

        let cors_raw =
            std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:8081".into());
        let cors_origins = parse_origins(&cors_raw)?;

        let request_timeout_secs = env_or("REQUEST_TIMEOUT_SECS", 30_u64)?;

        let defaults = NotificationPolicy::default();
        let notification_policy = NotificationPolicy {
            should_show_alert: env_or("NOTIFY_SHOW_ALERT", defaults.should_show_alert)?,
            should_play_sound: env_or("NOTIFY_PLAY_SOUND", defaults.should_play_sound)?,
            should_set_badge: env_or("NOTIFY_SET_BADGE", defaults.should_set_badge)?,
        };

        let notification_webhook_url = std::env::var("NOTIFICATION_WEBHOOK_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            notification_policy,
            notification_webhook_url,
        })
    }
}

/// Read `key` from the environment, falling back to `default` when unset.
fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| ConfigError::Invalid {
                key: "CORS_ORIGINS",
                value: origin.to_string(),
            })
        })
        .collect()
}
