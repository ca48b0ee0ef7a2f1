//! Scope composition.
//!
//! # Data Flow
//! ```text
//! middleware installs a ScopeStack for the request (task-local)
//!     → handlers / nested calls push frames (ScopeGuard)
//!     → logger flattens the active frames into every record it builds
//!     → guards drop on every exit path, innermost first
//! ```
//!
//! # Design Decisions
//! - One stack per logical operation, never shared across requests
//! - Release is tied to guard lifetime (RAII), not manual cleanup
//! - Outside an installed stack, pushes are no-ops

pub mod frame;
pub mod stack;

pub use frame::{render_value, ScopeFrame};
pub use stack::{ScopeGuard, ScopeStack};

use std::future::Future;

tokio::task_local! {
    static ACTIVE_SCOPES: ScopeStack;
}

/// Run `fut` with `stack` as the active scope stack.
pub async fn scoped<F: Future>(stack: ScopeStack, fut: F) -> F::Output {
    ACTIVE_SCOPES.scope(stack, fut).await
}

/// The scope stack installed for the current task, if any.
pub fn current() -> Option<ScopeStack> {
    ACTIVE_SCOPES.try_with(ScopeStack::clone).ok()
}

/// Push a frame onto the current task's stack.
///
/// Returns `None` when no stack is installed.
pub fn push(frame: ScopeFrame) -> Option<ScopeGuard> {
    current().map(|stack| stack.push(frame))
}
