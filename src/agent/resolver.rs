//! Status resolution.
//!
//! # Responsibilities
//! - Combine the latest health and stats snapshots into one status
//! - Apply drain policy and per-requester `ready` hysteresis
//! - Record request, drain and weight metrics
//! - Contain every failure as `drain`

use std::net::IpAddr;
use std::sync::Arc;
use thiserror::Error;

use crate::agent::requesters::RequesterTable;
use crate::agent::status::{AgentStatus, StatusClass};
use crate::agent::weight::{LoadSignal, WeightCalculator, WeightError};
use crate::observability::metrics;
use crate::watcher::{StatsSnapshot, Watcher};

/// Errors raised while resolving a non-drain status.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("stats carry neither stress_level nor participants")]
    MissingLoadSignal,

    #[error(transparent)]
    Weight(#[from] WeightError),
}

/// Resolves the status reported to each requester.
pub struct Agent {
    watcher: Arc<Watcher>,
    calculator: WeightCalculator,
    requesters: RequesterTable,
}

impl Agent {
    pub fn new(watcher: Arc<Watcher>, calculator: WeightCalculator, max_requesters: usize) -> Self {
        Self {
            watcher,
            calculator,
            requesters: RequesterTable::new(max_requesters),
        }
    }

    pub fn watcher(&self) -> &Arc<Watcher> {
        &self.watcher
    }

    pub fn requesters(&self) -> &RequesterTable {
        &self.requesters
    }

    /// Resolve against the watcher's current snapshots. Never waits.
    pub fn status_for(&self, requester: IpAddr) -> AgentStatus {
        let health = self.watcher.health();
        let stats = self.watcher.stats();
        self.resolve(requester, health, stats.as_deref())
    }

    /// Resolve against explicit snapshots.
    pub fn resolve(&self, requester: IpAddr, health: bool, stats: Option<&StatsSnapshot>) -> AgentStatus {
        metrics::record_request();

        match self.try_resolve(requester, health, stats) {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(requester = %requester, error = %e, "Error resolving status, reporting drain");
                metrics::record_drain();
                self.requesters.record(requester, StatusClass::Drain);
                AgentStatus::Drain
            }
        }
    }

    fn try_resolve(
        &self,
        requester: IpAddr,
        health: bool,
        stats: Option<&StatsSnapshot>,
    ) -> Result<AgentStatus, ResolveError> {
        let stats = match stats {
            Some(stats) if health && !stats.graceful_shutdown => stats,
            _ => {
                tracing::debug!(
                    requester = %requester,
                    health,
                    stats_present = stats.is_some(),
                    graceful_shutdown = stats.map_or(false, |s| s.graceful_shutdown),
                    "Backend not accepting traffic"
                );
                metrics::record_drain();
                self.requesters.record(requester, StatusClass::Drain);
                return Ok(AgentStatus::Drain);
            }
        };

        let load = load_signal(stats).ok_or(ResolveError::MissingLoadSignal)?;
        let weight = self.calculator.weight_for(load)?;

        let stress = match load {
            LoadSignal::Stress(s) => Some(s),
            LoadSignal::Participants(_) => None,
        };
        metrics::record_weight(stats.participants.unwrap_or(0.0), weight.get(), stress);

        // First non-drain answer after a drain (or to a new requester) is `ready`.
        match self.requesters.record(requester, StatusClass::Ready) {
            Some(StatusClass::Ready) => Ok(AgentStatus::Weight(weight)),
            Some(StatusClass::Drain) | None => Ok(AgentStatus::Ready),
        }
    }
}

/// Stress level wins over participant count when both are present.
fn load_signal(stats: &StatsSnapshot) -> Option<LoadSignal> {
    stats
        .stress_level
        .map(LoadSignal::Stress)
        .or_else(|| stats.participants.map(LoadSignal::Participants))
}
