//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde and env parsing handle syntax)
//! - Validate value ranges (caps and intervals > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: AgentConfig → Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted; any error is fatal at startup

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AgentConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check every semantic constraint and collect the failures.
pub fn validate_config(config: &AgentConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.socket_addr().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not an IP address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be greater than 0"));
    }

    if config.backend.host.trim().is_empty() {
        errors.push(ValidationError::new("backend.host", "must not be empty"));
    } else if config.backend.base_url().is_err() {
        errors.push(ValidationError::new(
            "backend.host",
            format!("'{}' does not form a valid URL", config.backend.host),
        ));
    }
    for (field, path) in [
        ("backend.health_path", &config.backend.health_path),
        ("backend.stats_path", &config.backend.stats_path),
    ] {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(field, "must start with '/'"));
        }
    }

    if config.weights.max_participants == 0 {
        errors.push(ValidationError::new("weights.max_participants", "must be greater than 0"));
    }
    if config.weights.max_percentage == 0 {
        errors.push(ValidationError::new("weights.max_percentage", "must be greater than 0"));
    }

    for (field, value) in [
        ("polling.health_interval_ms", config.polling.health_interval_ms),
        ("polling.stats_interval_ms", config.polling.stats_interval_ms),
        ("polling.fetch_timeout_ms", config.polling.fetch_timeout_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }

    if config.requesters.max_tracked == 0 {
        errors.push(ValidationError::new("requesters.max_tracked", "must be greater than 0"));
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("expected one of {}", LOG_LEVELS.join(", ")),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
