//! Non-blocking dispatch queue.
//!
//! # Data Flow
//! ```text
//! Logger::log (caller task)
//!     → SinkProvider::enqueue(Arc<LogRecord>)   (unbounded, never blocks)
//!     → worker.rs (one task per provider)
//!         → Sink::dispatch
//!         → failure? Terminal::report, once, never back into the pipeline
//!
//! Shutdown:
//!     SinkProvider::shutdown → Draining → drain queue (bounded) → Stopped
//! ```
//!
//! # Design Decisions
//! - The worker awaits the queue; there is no sleep-poll loop
//! - FIFO per producer; no ordering across providers
//! - No back-pressure and no retries; a slow collector only grows its queue
//! - Providers are explicitly owned (`Arc`) and explicitly shut down

pub mod provider;
mod worker;

pub use provider::{ProviderState, SinkProvider};
