//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults (schema.rs)
//!     → optional TOML file (loader.rs, `--config <path>`)
//!     → environment overrides (loader.rs)
//!     → validation.rs (semantic checks)
//!     → AgentConfig (validated, immutable)
//!     → handed to the watcher, agent and listener at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults so the agent runs with no config at all
//! - Validation separates syntactic (serde / env parsing) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AgentConfig, BackendConfig, ListenerConfig, LogFormat, ObservabilityConfig, PollingConfig,
    RequesterConfig, WeightConfig,
};
pub use validation::{validate_config, ValidationError};
