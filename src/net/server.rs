//! Agent-check TCP server.
//!
//! # Responsibilities
//! - Accept connections from load balancers
//! - Write one status line per connection, then close
//! - Drain in-flight connections on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use crate::agent::Agent;
use crate::net::connection::{ConnectionGuard, ConnectionTracker};
use crate::net::listener::{Listener, ListenerError};
use crate::observability::metrics;

/// Serves agent-check responses.
pub struct AgentServer {
    agent: Arc<Agent>,
    tracker: ConnectionTracker,
    drain_timeout: Duration,
}

impl AgentServer {
    pub fn new(agent: Arc<Agent>, drain_timeout: Duration) -> Self {
        Self {
            agent,
            tracker: ConnectionTracker::new(),
            drain_timeout,
        }
    }

    /// Run the accept loop until `shutdown` fires.
    ///
    /// Accept failures are logged and counted; only a closed limiter ends the loop early.
    pub async fn run(
        &self,
        listener: Listener,
        shutdown: CancellationToken,
    ) -> Result<(), ListenerError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "Agent check listening");
        }

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested, no longer accepting");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        let agent = Arc::clone(&self.agent);
                        let guard = self.tracker.track();
                        tokio::spawn(async move {
                            handle_connection(agent, stream, peer, guard).await;
                            drop(permit);
                        });
                    }
                    Err(ListenerError::Closed) => return Err(ListenerError::Closed),
                    Err(e) => {
                        metrics::record_connection_error("accept");
                        tracing::warn!(error = %e, "Accept failed");
                        // Avoid spinning on persistent errors such as fd exhaustion.
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                },
            }
        }

        drop(listener);

        let active = self.tracker.active_count();
        if active > 0 {
            tracing::info!(active, "Draining connections");
            if !self.tracker.wait_idle_for(self.drain_timeout).await {
                tracing::warn!(
                    remaining = self.tracker.active_count(),
                    timeout_secs = self.drain_timeout.as_secs(),
                    "Drain timed out"
                );
            }
        }

        Ok(())
    }
}

async fn handle_connection(agent: Arc<Agent>, mut stream: TcpStream, peer: SocketAddr, guard: ConnectionGuard) {
    let status = agent.status_for(peer.ip());

    if let Err(e) = stream.write_all(status.to_line().as_bytes()).await {
        metrics::record_connection_error("write");
        tracing::warn!(connection_id = %guard.id(), peer = %peer, error = %e, "Failed to write status");
        return;
    }

    if let Err(e) = stream.shutdown().await {
        metrics::record_connection_error("close");
        tracing::debug!(connection_id = %guard.id(), peer = %peer, error = %e, "Failed to close connection");
    }

    tracing::info!(connection_id = %guard.id(), peer = %peer, status = %status, "Agent status sent");
}
