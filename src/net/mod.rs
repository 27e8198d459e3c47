//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection (load balancer agent-check)
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (lifecycle tracking for shutdown drain)
//!     → server.rs (resolve status, write one line, close)
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Connecting is the request; nothing is read from the peer
//! - Per-connection errors never stop the accept loop

pub mod connection;
pub mod listener;
pub mod server;

pub use listener::{Listener, ListenerError};
pub use server::AgentServer;
