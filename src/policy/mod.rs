//! Redaction and filter policy.
//!
//! # Data Flow
//! ```text
//! MiddlewareConfig.{ignore_actions, security_actions}
//!     → ActionPolicy::from_config (normalised "VERB:path" keys)
//!     → ArcSwap<ActionPolicy> held by the middleware controls
//!     → per call: is_ignored? → skip; is_secured? → body replaced
//! ```
//!
//! # Design Decisions
//! - Pure lookups, no I/O; the whole policy is swapped on reload
//! - Exact match only; no prefix or pattern rules

pub mod filter;

pub use filter::{action_key, ActionPolicy, REDACTED_BODY};
