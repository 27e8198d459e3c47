//! Load-balancer agent-check responder.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                 AGENT CHECK                   │
//!                         │                                               │
//!   Load balancer         │  ┌──────────┐   ┌──────────┐   ┌───────────┐  │
//!   ──── TCP connect ─────┼─▶│   net    │──▶│  agent   │──▶│  status   │──┼──▶ "ready" / "N%" / "drain"
//!                         │  │ listener │   │ resolver │   │   line    │  │
//!                         │  └──────────┘   └────▲─────┘   └───────────┘  │
//!                         │                      │ snapshots              │
//!                         │                 ┌────┴─────┐   ┌───────────┐  │
//!                         │                 │ watcher  │◀──│  source   │◀─┼──── Backend /about/health
//!                         │                 │ (polls)  │   │  (REST)   │  │     Backend /about/stats
//!                         │                 └──────────┘   └───────────┘  │
//!                         │                                               │
//!                         │  config · lifecycle · observability           │
//!                         └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use agent_check::config::load_config;
use agent_check::lifecycle::{wait_for_signal, AgentService, Shutdown, StartupError};
use agent_check::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "agent-check")]
#[command(about = "Reports backend load to a load balancer over the agent-check protocol", long_about = None)]
struct Cli {
    /// TOML configuration file. Environment variables override its values.
    #[arg(short, long, env = "AGENT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Agent failed");
            eprintln!("agent-check: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), StartupError> {
    let config = load_config(cli.config.as_deref())?;

    logging::init_logging(&config.observability).map_err(|e| StartupError::Logging(e.to_string()))?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "agent-check starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        port = config.listener.port,
        backend = %format!("{}:{}", config.backend.host, config.backend.port),
        max_participants = config.weights.max_participants,
        max_percentage = config.weights.max_percentage,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|e: std::net::AddrParseError| StartupError::Metrics(e.to_string()))?;
        metrics::init_metrics(addr).map_err(|e| StartupError::Metrics(e.to_string()))?;
        tracing::info!(address = %addr, "Metrics exporter listening");
    }

    let service = AgentService::build(&config).await?;

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    service.run(&shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
