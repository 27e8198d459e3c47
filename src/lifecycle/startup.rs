//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the data source, watcher, and agent from configuration
//! - Bind the listener before any traffic is served
//! - Map startup failures to process exit codes

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;

use crate::agent::{Agent, WeightCalculator, WeightError};
use crate::config::{AgentConfig, ConfigError};
use crate::lifecycle::Shutdown;
use crate::net::{AgentServer, Listener, ListenerError};
use crate::source::{DataSource, FetchError, RestClient};
use crate::watcher::{Watcher, WatcherSettings};

/// Fatal startup errors.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("weight bounds: {0}")]
    Weight(#[from] WeightError),

    #[error("backend source: {0}")]
    Source(#[from] FetchError),

    #[error("listener: {0}")]
    Listener(#[from] ListenerError),

    #[error("metrics exporter: {0}")]
    Metrics(String),

    #[error("logging: {0}")]
    Logging(String),
}

impl StartupError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            StartupError::Config(_) | StartupError::Weight(_) | StartupError::Source(_) => 2,
            StartupError::Listener(_) => 3,
            StartupError::Metrics(_) => 4,
            StartupError::Logging(_) => 1,
        }
    }
}

/// A fully wired agent, bound and ready to run.
pub struct AgentService {
    agent: Arc<Agent>,
    listener: Listener,
    local_addr: SocketAddr,
    server: AgentServer,
}

impl AgentService {
    /// Build against the backend REST endpoints named in `config`.
    pub async fn build(config: &AgentConfig) -> Result<Self, StartupError> {
        let source = RestClient::new(&config.backend, config.polling.fetch_timeout())?;
        tracing::info!(
            health_url = %source.health_url(),
            stats_url = %source.stats_url(),
            "Backend source configured"
        );
        Self::build_with_source(config, Arc::new(source)).await
    }

    /// Build against an arbitrary data source.
    pub async fn build_with_source(
        config: &AgentConfig,
        source: Arc<dyn DataSource>,
    ) -> Result<Self, StartupError> {
        let calculator = WeightCalculator::from_config(&config.weights)?;
        let watcher = Arc::new(Watcher::new(source, WatcherSettings::from(&config.polling)));
        let agent = Arc::new(Agent::new(watcher, calculator, config.requesters.max_tracked));

        let listener = Listener::bind(&config.listener).await?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;
        let server = AgentServer::new(Arc::clone(&agent), config.listener.drain_timeout());

        Ok(Self {
            agent,
            listener,
            local_addr,
            server,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    pub fn watcher(&self) -> &Arc<Watcher> {
        self.agent.watcher()
    }

    /// Start polling, serve until `shutdown` triggers, then stop polling.
    pub async fn run(self, shutdown: &Shutdown) -> Result<(), StartupError> {
        let Self {
            agent,
            listener,
            server,
            ..
        } = self;

        agent.watcher().start();
        let served = server.run(listener, shutdown.token()).await;
        agent.watcher().stop().await;

        tracing::info!("Agent stopped");
        served.map_err(StartupError::from)
    }
}
