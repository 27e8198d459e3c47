//! Status resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound connection (requester IP)
//!     → resolver.rs (read cached health + stats)
//!     → drain? → requesters.rs (class = drain) → "drain"
//!     → weight.rs (stress level, else participants → [1, max_percentage])
//!     → requesters.rs (was drain / unknown? → "ready", else → "N%")
//!     → status.rs (wire token)
//! ```
//!
//! # Design Decisions
//! - Resolution never waits: snapshots are atomic loads
//! - Every failure resolves to `drain`; the protocol has no error channel
//! - Weight 0 is never reported; `drain` is the only "no traffic" signal

pub mod requesters;
pub mod resolver;
pub mod status;
pub mod weight;

pub use requesters::RequesterTable;
pub use resolver::{Agent, ResolveError};
pub use status::{AgentStatus, StatusClass};
pub use weight::{LoadSignal, Weight, WeightCalculator, WeightError};
