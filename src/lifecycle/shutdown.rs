//! Shutdown coordination for the agent.

use tokio_util::sync::CancellationToken;

/// Coordinator for graceful shutdown.
///
/// Triggering is sticky: tasks that start waiting after `trigger` still
/// observe it, so a signal that arrives before the server is running is
/// never lost.
#[derive(Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that long-running tasks select on.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }
}
