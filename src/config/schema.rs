//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the agent.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Root configuration for the agent.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AgentConfig {
    /// Agent-check listener (bind address, port, limits).
    pub listener: ListenerConfig,

    /// Backend whose health and stats are polled.
    pub backend: BackendConfig,

    /// Weight derivation bounds.
    pub weights: WeightConfig,

    /// Poll intervals and fetch timeout.
    pub polling: PollingConfig,

    /// Per-requester hysteresis table.
    pub requesters: RequesterConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address without port (e.g., "0.0.0.0").
    pub bind_address: String,

    /// TCP port the load balancer connects to.
    pub port: u16,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// How long shutdown waits for in-flight connections, in seconds.
    pub drain_timeout_secs: u64,
}

impl ListenerConfig {
    /// Combine bind address and port into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let ip: IpAddr = self.bind_address.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 7070,
            max_connections: 1024,
            drain_timeout_secs: 5,
        }
    }
}

/// Backend (polled service) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Backend host name or IP.
    pub host: String,

    /// Backend HTTP port.
    pub port: u16,

    /// Path of the health document.
    pub health_path: String,

    /// Path of the stats document.
    pub stats_path: String,
}

impl BackendConfig {
    /// Base URL of the backend, e.g. `http://localhost:8788/`.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("http://{}:{}/", self.host, self.port))
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8788,
            health_path: "/about/health".to_string(),
            stats_path: "/about/stats".to_string(),
        }
    }
}

/// Bounds used when deriving a weight from load.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WeightConfig {
    /// Participant count at which the backend is considered full.
    pub max_participants: u32,

    /// Weight reported for an idle backend.
    pub max_percentage: u32,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            max_participants: 250,
            max_percentage: 100,
        }
    }
}

/// Polling cadence for the backend watcher.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Health poll interval in milliseconds.
    pub health_interval_ms: u64,

    /// Stats poll interval in milliseconds.
    pub stats_interval_ms: u64,

    /// Per-fetch timeout in milliseconds.
    pub fetch_timeout_ms: u64,
}

impl PollingConfig {
    pub fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            health_interval_ms: 30_000,
            stats_interval_ms: 10_000,
            fetch_timeout_ms: 1_000,
        }
    }
}

/// Requester tracking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequesterConfig {
    /// Maximum number of requester addresses remembered for hysteresis.
    pub max_tracked: usize,
}

impl Default for RequesterConfig {
    fn default() -> Self {
        Self { max_tracked: 1024 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for development.
    #[default]
    Pretty,
    /// One JSON object per line, for log aggregation.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => f.write_str("pretty"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AgentConfig::default();
        assert_eq!(config.listener.port, 7070);
        assert_eq!(config.backend.port, 8788);
        assert_eq!(config.weights.max_participants, 250);
        assert_eq!(config.weights.max_percentage, 100);
        assert_eq!(config.polling.fetch_timeout(), Duration::from_millis(1000));
        assert_eq!(
            config.listener.socket_addr().unwrap(),
            "0.0.0.0:7070".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: AgentConfig = toml::from_str(
            r#"
            [backend]
            host = "10.0.0.5"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.host, "10.0.0.5");
        assert_eq!(config.backend.port, 8788);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.polling.stats_interval_ms, 10_000);
    }

    #[test]
    fn backend_base_url() {
        let backend = BackendConfig::default();
        let url = backend.base_url().unwrap();
        assert_eq!(url.join(&backend.stats_path).unwrap().as_str(), "http://localhost:8788/about/stats");
    }
}
