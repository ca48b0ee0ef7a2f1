//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (capture limit > 0, drain timeout > 0)
//! - Reject incomplete action rules
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AuditConfig → Result<(), Vec<ValidationError>>
//! - Collector URIs are not checked here; a misconfigured collector disables
//!   itself with a console warning instead of rejecting the whole file

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{ActionRule, AuditConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("middleware.max_capture_bytes must be greater than zero")]
    ZeroCaptureLimit,

    #[error("middleware.{section}[{index}] needs both a method and a path")]
    IncompleteActionRule { section: &'static str, index: usize },

    #[error("dispatch.drain_timeout_ms must be greater than zero")]
    ZeroDrainTimeout,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

pub fn validate_config(config: &AuditConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.middleware.max_capture_bytes == 0 {
        errors.push(ValidationError::ZeroCaptureLimit);
    }

    check_rules("ignore_actions", &config.middleware.ignore_actions, &mut errors);
    check_rules("security_actions", &config.middleware.security_actions, &mut errors);

    if config.dispatch.drain_timeout_ms == 0 {
        errors.push(ValidationError::ZeroDrainTimeout);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_rules(section: &'static str, rules: &[ActionRule], errors: &mut Vec<ValidationError>) {
    for (index, rule) in rules.iter().enumerate() {
        if rule.method.trim().is_empty() || rule.path.trim().is_empty() {
            errors.push(ValidationError::IncompleteActionRule { section, index });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&AuditConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = AuditConfig::default();
        config.middleware.max_capture_bytes = 0;
        config.middleware.security_actions = vec![ActionRule::new("POST", " ")];
        config.dispatch.drain_timeout_ms = 0;
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroCaptureLimit,
                ValidationError::IncompleteActionRule {
                    section: "security_actions",
                    index: 0
                },
                ValidationError::ZeroDrainTimeout,
                ValidationError::InvalidMetricsAddress("nowhere".to_string()),
            ]
        );
    }
}
