//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build source, watcher, agent → Bind listener
//!
//! Run:
//!     Start watcher → Serve agent checks
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → Stop accepting → Drain connections → Stop watcher → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and maps to an exit code
//! - Listener binds before the watcher starts polling
//! - Shutdown has timeout: connections still open after the deadline are abandoned

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
pub use startup::{AgentService, StartupError};
