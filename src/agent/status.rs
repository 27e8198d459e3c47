//! Reportable agent status.

use std::fmt;

use crate::agent::weight::Weight;

/// What the agent tells the load balancer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    /// Send no new traffic.
    Drain,
    /// Back in service after a drain (or first contact).
    Ready,
    /// In service with the given relative weight.
    Weight(Weight),
}

impl AgentStatus {
    /// Hysteresis class recorded for the requester.
    pub fn class(&self) -> StatusClass {
        match self {
            AgentStatus::Drain => StatusClass::Drain,
            AgentStatus::Ready | AgentStatus::Weight(_) => StatusClass::Ready,
        }
    }

    /// Wire form: the token followed by a newline.
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Drain => f.write_str("drain"),
            AgentStatus::Ready => f.write_str("ready"),
            AgentStatus::Weight(w) => write!(f, "{}%", w),
        }
    }
}

/// Last status class reported to a requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Drain,
    Ready,
}
