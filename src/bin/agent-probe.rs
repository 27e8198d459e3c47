use clap::{Parser, Subcommand};
use serde_json::Value;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use agent_check::config::loader::apply_env_overrides;
use agent_check::config::{AgentConfig, BackendConfig};
use agent_check::source::{is_truthy, DataSource, RestClient};
use agent_check::watcher::StatsSnapshot;
use agent_check::WeightCalculator;

#[derive(Parser)]
#[command(name = "agent-probe")]
#[command(about = "Diagnostic CLI for the agent-check responder", long_about = None)]
struct Cli {
    /// Timeout for each network call, in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to a running agent and print the status it reports
    Status {
        #[arg(short, long, default_value = "127.0.0.1:7070")]
        agent: String,
    },
    /// Fetch the backend health endpoint
    Health {
        #[command(flatten)]
        backend: BackendArgs,
    },
    /// Fetch the backend stats endpoint
    Stats {
        #[command(flatten)]
        backend: BackendArgs,
    },
    /// Compute the weight for a given load without touching the network
    Weight {
        #[arg(long, conflicts_with = "stress")]
        participants: Option<f64>,
        #[arg(long)]
        stress: Option<f64>,
        #[arg(long, default_value_t = 250)]
        max_participants: u32,
        #[arg(long, default_value_t = 100)]
        max_percentage: u32,
    },
}

/// Backend address. Unset flags fall back to the agent's environment
/// variables (`BACKEND_HOST`/`JIGASI_HOST`, `BACKEND_PORT`/`JIGASI_PORT`).
#[derive(clap::Args)]
struct BackendArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
}

impl BackendArgs {
    fn client(&self, timeout: Duration) -> Result<RestClient, Box<dyn std::error::Error>> {
        let mut config = AgentConfig::default();
        apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

        let backend = BackendConfig {
            host: self.host.clone().unwrap_or(config.backend.host),
            port: self.port.unwrap_or(config.backend.port),
            ..config.backend
        };
        Ok(RestClient::new(&backend, timeout)?)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let timeout = Duration::from_millis(cli.timeout_ms);

    match cli.command {
        Commands::Status { agent } => {
            let mut stream = tokio::time::timeout(timeout, TcpStream::connect(&agent)).await??;
            let mut line = String::new();
            tokio::time::timeout(timeout, stream.read_to_string(&mut line)).await??;
            println!("{}", line.trim_end());
        }
        Commands::Health { backend } => {
            let client = backend.client(timeout)?;
            let body = client.fetch_health().await?;
            print_json(&body)?;
            println!("healthy: {}", is_truthy(&body));
        }
        Commands::Stats { backend } => {
            let client = backend.client(timeout)?;
            let body = client.fetch_stats().await?;
            print_json(&body)?;
            let snapshot = StatsSnapshot::from_payload(body)?;
            println!(
                "participants: {:?}, stress_level: {:?}, graceful_shutdown: {}",
                snapshot.participants, snapshot.stress_level, snapshot.graceful_shutdown
            );
        }
        Commands::Weight {
            participants,
            stress,
            max_participants,
            max_percentage,
        } => {
            let calculator = WeightCalculator::new(max_participants, max_percentage)?;
            let weight = match (stress, participants) {
                (Some(s), _) => calculator.from_stress(s)?,
                (None, Some(p)) => calculator.from_participants(p)?,
                (None, None) => {
                    eprintln!("Error: pass --participants or --stress");
                    std::process::exit(2);
                }
            };
            println!("{}%", weight);
        }
    }

    Ok(())
}

fn print_json(value: &Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
