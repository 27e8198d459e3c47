//! Self re-arming poll task.
//!
//! Each run fetches, publishes, then sleeps for the interval before the
//! next run. Cancellation is checked while fetching, before publishing and
//! while sleeping, so once the task has been joined after cancellation no
//! further value is published.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Which backend signal a poll task watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Health,
    Stats,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Health => "health",
            Signal::Stats => "stats",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to a running poll task.
pub(crate) struct PollTask {
    signal: Signal,
    handle: JoinHandle<()>,
}

impl PollTask {
    /// Spawn a repeating poll. The first run starts immediately.
    pub(crate) fn spawn<T, F, Fut, P>(
        signal: Signal,
        interval: Duration,
        token: CancellationToken,
        mut fetch: F,
        publish: P,
    ) -> Self
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        P: Fn(T) + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tracing::debug!(signal = %signal, interval_ms = interval.as_millis() as u64, "Poll cycle started");

            loop {
                let value = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    value = fetch() => value,
                };

                if token.is_cancelled() {
                    break;
                }
                publish(value);

                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }

            tracing::debug!(signal = %signal, "Poll cycle stopped");
        });

        Self { signal, handle }
    }

    /// Wait for the task to exit after its token was cancelled.
    pub(crate) async fn join(self) {
        if let Err(e) = self.handle.await {
            tracing::error!(signal = %self.signal, error = %e, "Poll task ended abnormally");
        }
    }
}
