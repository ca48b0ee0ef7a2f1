//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build pipeline → Start listener + watcher
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C received → Stop accepting → Drain provider queues → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, close
//! - Draining is bounded by `dispatch.drain_timeout_ms`

pub mod shutdown;

pub use shutdown::Shutdown;
