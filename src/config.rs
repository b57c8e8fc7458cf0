//! Configuration — environment-driven settings for the gateway.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the external RAG backend.
    pub rag_api_base: String,
    /// Port the gateway listens on.
    pub port: u16,
    /// Bounded wait for proxied chat calls.
    pub chat_timeout: Duration,
    /// Bounded wait for proxied health calls.
    pub health_timeout: Duration,
    /// How often the health probe re-polls the backend.
    pub probe_interval: Duration,
    /// Optional JSON file overriding the built-in flow table.
    pub flows_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rag_api_base: "http://127.0.0.1:8000".to_string(),
            port: 5050,
            chat_timeout: Duration::from_secs(60),
            health_timeout: Duration::from_secs(15),
            probe_interval: Duration::from_secs(30),
            flows_path: None,
        }
    }
}

impl Config {
    /// Read configuration from the environment, falling back to defaults
    /// for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(base) = std::env::var("RAG_API_BASE") {
            config.rag_api_base = base.trim_end_matches('/').to_string();
        }
        if let Ok(port) = std::env::var("WIDGET_PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "WIDGET_PORT".to_string(),
                message: format!("not a valid port: {port}"),
            })?;
        }
        config.chat_timeout = secs_var("WIDGET_CHAT_TIMEOUT_SECS", config.chat_timeout)?;
        config.health_timeout = secs_var("WIDGET_HEALTH_TIMEOUT_SECS", config.health_timeout)?;
        config.probe_interval = secs_var("WIDGET_PROBE_INTERVAL_SECS", config.probe_interval)?;
        if let Ok(path) = std::env::var("WIDGET_FLOWS_PATH") {
            if !path.is_empty() {
                config.flows_path = Some(PathBuf::from(path));
            }
        }

        Ok(config)
    }
}

fn secs_var(key: &str, default: Duration) -> Result<Duration, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected whole seconds, got: {raw}"),
            }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_field() {
        let config = Config::default();
        assert_eq!(config.rag_api_base, "http://127.0.0.1:8000");
        assert_eq!(config.chat_timeout, Duration::from_secs(60));
        assert_eq!(config.health_timeout, Duration::from_secs(15));
        assert_eq!(config.probe_interval, Duration::from_secs(30));
        assert!(config.flows_path.is_none());
    }

    #[test]
    fn secs_var_falls_back_when_unset() {
        let default = Duration::from_secs(42);
        let value = secs_var("WIDGET_TEST_UNSET_VAR", default).unwrap();
        assert_eq!(value, default);
    }
}
