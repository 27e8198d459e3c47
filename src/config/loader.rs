//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::config::schema::AgentConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_API_PORT: &str = "API_PORT";
pub const ENV_API_BIND_ADDRESS: &str = "API_BIND_ADDRESS";
pub const ENV_API_MAX_CONNECTIONS: &str = "API_MAX_CONNECTIONS";
pub const ENV_BACKEND_HOST: &str = "BACKEND_HOST";
pub const ENV_BACKEND_PORT: &str = "BACKEND_PORT";
pub const ENV_MAX_PARTICIPANTS: &str = "MAX_PARTICIPANTS";
pub const ENV_MAX_PERCENTAGE: &str = "MAX_PERCENTAGE";
pub const ENV_JIGASI_HOST: &str = "JIGASI_HOST";
pub const ENV_JIGASI_PORT: &str = "JIGASI_PORT";
pub const ENV_JIGASI_MAX_PARTICIPANTS: &str = "JIGASI_MAX_PARTICIPANTS";
pub const ENV_JIGASI_MAX_PERCENTAGE: &str = "JIGASI_MAX_PERCENTAGE";
pub const ENV_HEALTH_INTERVAL_MS: &str = "HEALTH_INTERVAL_MS";
pub const ENV_STATS_INTERVAL_MS: &str = "STATS_INTERVAL_MS";
pub const ENV_FETCH_TIMEOUT_MS: &str = "FETCH_TIMEOUT_MS";
pub const ENV_MAX_REQUESTERS: &str = "MAX_REQUESTERS";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";
pub const ENV_METRICS_ENABLED: &str = "METRICS_ENABLED";
pub const ENV_METRICS_ADDRESS: &str = "METRICS_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for {key}: {reason}")]
    Env {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then the
/// process environment. The result is validated before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<AgentConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => AgentConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML file into a config. Missing sections keep their defaults.
pub fn read_config_file(path: &Path) -> Result<AgentConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut AgentConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    if let Some(port) = env.parse(ENV_API_PORT)? {
        config.listener.port = port;
    }
    if let Some(addr) = env.string(ENV_API_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
    if let Some(max) = env.parse(ENV_API_MAX_CONNECTIONS)? {
        config.listener.max_connections = max;
    }
    // Jigasi deployment names are fallbacks; the generic names win.
    if let Some(host) = env.string_any(&[ENV_BACKEND_HOST, ENV_JIGASI_HOST]) {
        config.backend.host = host;
    }
    if let Some(port) = env.parse_any(&[ENV_BACKEND_PORT, ENV_JIGASI_PORT])? {
        config.backend.port = port;
    }
    if let Some(max) = env.parse_any(&[ENV_MAX_PARTICIPANTS, ENV_JIGASI_MAX_PARTICIPANTS])? {
        config.weights.max_participants = max;
    }
    if let Some(max) = env.parse_any(&[ENV_MAX_PERCENTAGE, ENV_JIGASI_MAX_PERCENTAGE])? {
        config.weights.max_percentage = max;
    }
    if let Some(ms) = env.parse(ENV_HEALTH_INTERVAL_MS)? {
        config.polling.health_interval_ms = ms;
    }
    if let Some(ms) = env.parse(ENV_STATS_INTERVAL_MS)? {
        config.polling.stats_interval_ms = ms;
    }
    if let Some(ms) = env.parse(ENV_FETCH_TIMEOUT_MS)? {
        config.polling.fetch_timeout_ms = ms;
    }
    if let Some(max) = env.parse(ENV_MAX_REQUESTERS)? {
        config.requesters.max_tracked = max;
    }
    if let Some(level) = env.string(ENV_LOG_LEVEL) {
        config.observability.log_level = level;
    }
    if let Some(format) = env.parse(ENV_LOG_FORMAT)? {
        config.observability.log_format = format;
    }
    if let Some(enabled) = env.parse(ENV_METRICS_ENABLED)? {
        config.observability.metrics_enabled = enabled;
    }
    if let Some(addr) = env.string(ENV_METRICS_ADDRESS) {
        config.observability.metrics_address = addr;
    }

    Ok(())
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Non-empty, trimmed value of `key`.
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Value of the first key in `keys` that is set.
    fn first(&self, keys: &[&'static str]) -> Option<(&'static str, String)> {
        keys.iter().find_map(|&key| self.string(key).map(|v| (key, v)))
    }

    fn string_any(&self, keys: &[&'static str]) -> Option<String> {
        self.first(keys).map(|(_, v)| v)
    }

    fn parse<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.parse_any(&[key])
    }

    fn parse_any<T>(&self, keys: &[&'static str]) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.first(keys) {
            None => Ok(None),
            Some((key, value)) => value.parse().map(Some).map_err(|e: T::Err| ConfigError::Env {
                key,
                reason: e.to_string(),
                value,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_defaults() {
        let mut config = AgentConfig::default();
        apply_env_overrides(
            &mut config,
            lookup(&[
                (ENV_API_PORT, "7171"),
                (ENV_BACKEND_HOST, "jvb.internal"),
                (ENV_MAX_PARTICIPANTS, "500"),
                (ENV_STATS_INTERVAL_MS, "2500"),
                (ENV_LOG_FORMAT, "JSON"),
                (ENV_METRICS_ENABLED, "true"),
            ]),
        )
        .unwrap();

        assert_eq!(config.listener.port, 7171);
        assert_eq!(config.backend.host, "jvb.internal");
        assert_eq!(config.weights.max_participants, 500);
        assert_eq!(config.weights.max_percentage, 100);
        assert_eq!(config.polling.stats_interval_ms, 2500);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert!(config.observability.metrics_enabled);
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = AgentConfig::default();
        apply_env_overrides(&mut config, lookup(&[(ENV_BACKEND_HOST, "  "), (ENV_API_PORT, "")]))
            .unwrap();
        assert_eq!(config.backend.host, "localhost");
        assert_eq!(config.listener.port, 7070);
    }

    #[test]
    fn malformed_env_value_is_reported() {
        let mut config = AgentConfig::default();
        let err = apply_env_overrides(&mut config, lookup(&[(ENV_BACKEND_PORT, "eighty")]))
            .unwrap_err();
        match err {
            ConfigError::Env { key, value, .. } => {
                assert_eq!(key, ENV_BACKEND_PORT);
                assert_eq!(value, "eighty");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn jigasi_names_configure_backend_and_weights() {
        let mut config = AgentConfig::default();
        apply_env_overrides(
            &mut config,
            lookup(&[
                (ENV_JIGASI_HOST, "jigasi.internal"),
                (ENV_JIGASI_PORT, "9999"),
                (ENV_JIGASI_MAX_PARTICIPANTS, "500"),
                (ENV_JIGASI_MAX_PERCENTAGE, "80"),
            ]),
        )
        .unwrap();

        assert_eq!(config.backend.host, "jigasi.internal");
        assert_eq!(config.backend.port, 9999);
        assert_eq!(config.weights.max_participants, 500);
        assert_eq!(config.weights.max_percentage, 80);
    }

    #[test]
    fn generic_names_win_over_jigasi_names() {
        let mut config = AgentConfig::default();
        apply_env_overrides(
            &mut config,
            lookup(&[
                (ENV_BACKEND_HOST, "backend.internal"),
                (ENV_JIGASI_HOST, "jigasi.internal"),
                (ENV_MAX_PARTICIPANTS, "300"),
                (ENV_JIGASI_MAX_PARTICIPANTS, "500"),
                (ENV_JIGASI_PORT, "not-a-port-but-shadowed"),
                (ENV_BACKEND_PORT, "8800"),
            ]),
        )
        .unwrap();

        assert_eq!(config.backend.host, "backend.internal");
        assert_eq!(config.backend.port, 8800);
        assert_eq!(config.weights.max_participants, 300);
    }

    #[test]
    fn invalid_jigasi_value_names_its_key() {
        let mut config = AgentConfig::default();
        let err = apply_env_overrides(&mut config, lookup(&[(ENV_JIGASI_PORT, "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { key: ENV_JIGASI_PORT, .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_config_file(Path::new("does-not-exist/agent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn file_then_validation() {
        let path = std::env::temp_dir().join(format!("agent-check-{}.toml", std::process::id()));
        fs::write(&path, "[weights]\nmax_participants = 0\n").unwrap();

        let config = read_config_file(&path).unwrap();
        assert_eq!(config.weights.max_participants, 0);
        assert!(validate_config(&config).is_err());

        fs::remove_file(&path).unwrap_or_default();
    }
}
