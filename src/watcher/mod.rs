//! Backend watcher subsystem.
//!
//! # Data Flow
//! ```text
//! task.rs (health timer)            task.rs (stats timer)
//!     → DataSource::fetch_health        → DataSource::fetch_stats
//!     → truthy? true : false            → truthy + decodable? Some(stats) : None
//!     → AtomicBool store                → ArcSwapOption store
//!     → watch channel (waiters)         → watch channel (waiters)
//!
//! Readers (agent, every inbound connection):
//!     health() / stats() → atomic load, never waits
//! ```
//!
//! # Design Decisions
//! - A failed poll replaces the snapshot with the failure sentinel; a stale
//!   "healthy" reading is never kept
//! - Fixed cadence after every run, success or not (no backoff)
//! - Failures stop at the poll cycle: sentinel value plus a warning
//! - Health and stats run on independent timers
//! - Fetch deadlines belong to the `DataSource`; the watcher adds none

pub mod snapshot;
pub mod task;

use arc_swap::ArcSwapOption;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::PollingConfig;
use crate::observability::metrics;
use crate::source::{is_truthy, DataSource, FetchError};
use task::PollTask;

pub use snapshot::StatsSnapshot;
pub use task::Signal;

/// Poll cadence for a [`Watcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherSettings {
    pub health_interval: Duration,
    pub stats_interval: Duration,
}

impl From<&PollingConfig> for WatcherSettings {
    fn from(config: &PollingConfig) -> Self {
        Self {
            health_interval: config.health_interval(),
            stats_interval: config.stats_interval(),
        }
    }
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

/// State shared between the watcher handle and its poll tasks.
struct Snapshots {
    source: Arc<dyn DataSource>,
    health: AtomicBool,
    stats: ArcSwapOption<StatsSnapshot>,
    health_tx: watch::Sender<bool>,
    stats_tx: watch::Sender<Option<Arc<StatsSnapshot>>>,
}

impl Snapshots {
    async fn fetch(&self, signal: Signal) -> Result<Value, FetchError> {
        match signal {
            Signal::Health => self.source.fetch_health().await,
            Signal::Stats => self.source.fetch_stats().await,
        }
    }

    async fn poll_health(&self) -> bool {
        match self.fetch(Signal::Health).await {
            Ok(payload) if is_truthy(&payload) => true,
            Ok(_) => {
                tracing::warn!("Health payload is empty, marking backend unhealthy");
                metrics::record_poll_failure(Signal::Health);
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed getting health");
                metrics::record_poll_failure(Signal::Health);
                false
            }
        }
    }

    async fn poll_stats(&self) -> Option<Arc<StatsSnapshot>> {
        let payload = match self.fetch(Signal::Stats).await {
            Ok(payload) if is_truthy(&payload) => payload,
            Ok(_) => {
                tracing::warn!("Stats payload is empty, dropping cached stats");
                metrics::record_poll_failure(Signal::Stats);
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed getting stats");
                metrics::record_poll_failure(Signal::Stats);
                return None;
            }
        };

        match StatsSnapshot::from_payload(payload) {
            Ok(stats) => Some(Arc::new(stats)),
            Err(e) => {
                tracing::warn!(error = %e, "Stats payload could not be decoded");
                metrics::record_poll_failure(Signal::Stats);
                None
            }
        }
    }

    fn publish_health(&self, healthy: bool) {
        let previous = self.health.swap(healthy, Ordering::AcqRel);
        if previous != healthy {
            tracing::info!(healthy, "Backend health changed");
        }
        self.health_tx.send_replace(healthy);
    }

    fn publish_stats(&self, stats: Option<Arc<StatsSnapshot>>) {
        tracing::trace!(stats = ?stats, "Stats updated");
        self.stats.store(stats.clone());
        self.stats_tx.send_replace(stats);
    }
}

struct Running {
    token: CancellationToken,
    tasks: Vec<PollTask>,
}

/// Keeps the latest backend health and stats in memory.
///
/// Reads are lock-free atomic loads and never wait on the network. Only the
/// two poll tasks started by [`Watcher::start`] perform I/O.
pub struct Watcher {
    shared: Arc<Snapshots>,
    settings: WatcherSettings,
    running: Mutex<Option<Running>>,
}

impl Watcher {
    /// Create a stopped watcher. Health starts `false`, stats start absent.
    pub fn new(source: Arc<dyn DataSource>, settings: WatcherSettings) -> Self {
        let (health_tx, _) = watch::channel(false);
        let (stats_tx, _) = watch::channel(None);

        Self {
            shared: Arc::new(Snapshots {
                source,
                health: AtomicBool::new(false),
                stats: ArcSwapOption::empty(),
                health_tx,
                stats_tx,
            }),
            settings,
            running: Mutex::new(None),
        }
    }

    /// Last known health. `false` until a poll succeeds.
    pub fn health(&self) -> bool {
        self.shared.health.load(Ordering::Acquire)
    }

    /// Last known stats. `None` until a poll succeeds, and after any failed poll.
    pub fn stats(&self) -> Option<Arc<StatsSnapshot>> {
        self.shared.stats.load_full()
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Start both poll cycles. The first poll of each fires immediately.
    ///
    /// Must be called from within a Tokio runtime. Calling it while already
    /// running does nothing.
    pub fn start(&self) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.is_some() {
            tracing::warn!("Watcher already running, ignoring start");
            return;
        }

        let token = CancellationToken::new();

        let health_task = {
            let fetcher = Arc::clone(&self.shared);
            let publisher = Arc::clone(&self.shared);
            PollTask::spawn(
                Signal::Health,
                self.settings.health_interval,
                token.clone(),
                move || {
                    let shared = Arc::clone(&fetcher);
                    async move { shared.poll_health().await }
                },
                move |healthy| publisher.publish_health(healthy),
            )
        };

        let stats_task = {
            let fetcher = Arc::clone(&self.shared);
            let publisher = Arc::clone(&self.shared);
            PollTask::spawn(
                Signal::Stats,
                self.settings.stats_interval,
                token.clone(),
                move || {
                    let shared = Arc::clone(&fetcher);
                    async move { shared.poll_stats().await }
                },
                move |stats| publisher.publish_stats(stats),
            )
        };

        tracing::info!(
            health_interval_ms = self.settings.health_interval.as_millis() as u64,
            stats_interval_ms = self.settings.stats_interval.as_millis() as u64,
            "Watcher started"
        );

        *running = Some(Running {
            token,
            tasks: vec![health_task, stats_task],
        });
    }

    /// Cancel both poll cycles and wait for them to exit.
    ///
    /// An in-flight fetch is abandoned and its result discarded. Once this
    /// returns, the snapshots no longer change until the next `start`.
    pub async fn stop(&self) {
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(running) = running else {
            return;
        };

        running.token.cancel();
        for task in running.tasks {
            task.join().await;
        }
        tracing::info!("Watcher stopped");
    }

    /// Run one health poll now and publish the result.
    pub async fn poll_health(&self) -> bool {
        let healthy = self.shared.poll_health().await;
        self.shared.publish_health(healthy);
        healthy
    }

    /// Run one stats poll now and publish the result.
    pub async fn poll_stats(&self) -> Option<Arc<StatsSnapshot>> {
        let stats = self.shared.poll_stats().await;
        self.shared.publish_stats(stats.clone());
        stats
    }

    /// Wait for the next published health value.
    pub async fn wait_for_health(&self) -> bool {
        let mut rx = self.shared.health_tx.subscribe();
        match rx.changed().await {
            Ok(()) => *rx.borrow_and_update(),
            Err(_) => self.health(),
        }
    }

    /// Wait for the next published stats value.
    pub async fn wait_for_stats(&self) -> Option<Arc<StatsSnapshot>> {
        let mut rx = self.shared.stats_tx.subscribe();
        match rx.changed().await {
            Ok(()) => rx.borrow_and_update().clone(),
            Err(_) => self.stats(),
        }
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        if let Ok(Some(running)) = self.running.get_mut() {
            running.token.cancel();
        }
    }
}
