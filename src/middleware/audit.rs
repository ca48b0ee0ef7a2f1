//! Live middleware settings shared by the HTTP middleware and the RPC
//! interceptor.

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::config::MiddlewareConfig;
use crate::policy::ActionPolicy;

/// Capture options and action policy, swappable at runtime.
#[derive(Clone)]
pub struct AuditControls {
    options: Arc<ArcSwap<MiddlewareConfig>>,
    policy: Arc<ArcSwap<ActionPolicy>>,
}

impl AuditControls {
    pub fn new(config: &MiddlewareConfig) -> Self {
        Self {
            options: Arc::new(ArcSwap::from_pointee(config.clone())),
            policy: Arc::new(ArcSwap::from_pointee(ActionPolicy::from_config(config))),
        }
    }

    /// Replace options and recompile the policy. In-flight requests keep the
    /// snapshot they started with.
    pub fn apply(&self, config: &MiddlewareConfig) {
        self.policy.store(Arc::new(ActionPolicy::from_config(config)));
        self.options.store(Arc::new(config.clone()));
    }

    pub fn options(&self) -> Arc<MiddlewareConfig> {
        self.options.load_full()
    }

    pub fn policy(&self) -> Arc<ActionPolicy> {
        self.policy.load_full()
    }
}
