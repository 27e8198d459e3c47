//! Load-balancer agent-check responder library.

pub mod agent;
pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod source;
pub mod watcher;

pub use agent::{Agent, AgentStatus, WeightCalculator};
pub use config::AgentConfig;
pub use lifecycle::{AgentService, Shutdown, StartupError};
pub use watcher::Watcher;
