//! Metrics collection and exposition.
//!
//! # Metrics
//! - `agent_requests_total` (counter): status requests served
//! - `agent_drain_total` (counter): requests answered with `drain`
//! - `agent_drain` (gauge): 1 when the last answer was `drain`, else 0
//! - `agent_participants` (gauge): participants behind the last answer
//! - `agent_percentage` (gauge): weight behind the last answer
//! - `agent_stress_level` (gauge): stress level behind the last answer
//! - `agent_poll_failures_total` (counter): failed polls, by signal
//! - `agent_connection_errors_total` (counter): accept/write failures, by stage

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

use crate::watcher::Signal;

pub const REQUESTS_TOTAL: &str = "agent_requests_total";
pub const DRAIN_TOTAL: &str = "agent_drain_total";
pub const DRAIN: &str = "agent_drain";
pub const PARTICIPANTS: &str = "agent_participants";
pub const PERCENTAGE: &str = "agent_percentage";
pub const STRESS_LEVEL: &str = "agent_stress_level";
pub const POLL_FAILURES_TOTAL: &str = "agent_poll_failures_total";
pub const CONNECTION_ERRORS_TOTAL: &str = "agent_connection_errors_total";

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request() {
    metrics::counter!(REQUESTS_TOTAL).increment(1);
}

pub fn record_drain() {
    metrics::counter!(DRAIN_TOTAL).increment(1);
    metrics::gauge!(DRAIN).set(1.0);
    metrics::gauge!(PARTICIPANTS).set(0.0);
    metrics::gauge!(PERCENTAGE).set(0.0);
    metrics::gauge!(STRESS_LEVEL).set(0.0);
}

pub fn record_weight(participants: f64, percentage: u32, stress_level: Option<f64>) {
    metrics::gauge!(DRAIN).set(0.0);
    metrics::gauge!(PARTICIPANTS).set(participants);
    metrics::gauge!(PERCENTAGE).set(percentage as f64);
    if let Some(stress) = stress_level {
        metrics::gauge!(STRESS_LEVEL).set(stress);
    }
}

pub fn record_poll_failure(signal: Signal) {
    metrics::counter!(POLL_FAILURES_TOTAL, "signal" => signal.as_str()).increment(1);
}

pub fn record_connection_error(stage: &'static str) {
    metrics::counter!(CONNECTION_ERRORS_TOTAL, "stage" => stage).increment(1);
}
