//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AuditConfig (validated, immutable)
//!     → Pipeline::from_config builds sinks and providers
//!     → AuditControls::new compiles the action policy
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → Pipeline::apply swaps sink settings (ArcSwap)
//!     → AuditControls::apply swaps policy and capture options
//!     → next dispatch / next request observes the new values
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - An invalid revision is logged and ignored; the running config stays

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ActionRule, ApplicationConfig, AuditConfig, ConsoleConfig, DispatchConfig,
    EventCollectorConfig, IndexCollectorConfig, MiddlewareConfig, ObservabilityConfig,
    ServerConfig,
};
pub use watcher::ConfigWatcher;
