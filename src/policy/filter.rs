//! Ignore and security rule matching.

use std::collections::HashSet;

use crate::config::{ActionRule, MiddlewareConfig};

/// Replaces the body of a call matching a security rule.
pub const REDACTED_BODY: &str = "*** OMITTED FOR SECURITY ***";

/// Normalised rule key: verb upper-cased, path lower-cased.
pub fn action_key(verb: &str, path: &str) -> String {
    format!("{}:{}", verb.trim().to_uppercase(), path.trim().to_lowercase())
}

/// Compiled ignore and security rule sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionPolicy {
    ignored: HashSet<String>,
    secured: HashSet<String>,
}

impl ActionPolicy {
    pub fn new(ignore: &[ActionRule], security: &[ActionRule]) -> Self {
        let compile = |rules: &[ActionRule]| {
            rules
                .iter()
                .map(|rule| action_key(&rule.method, &rule.path))
                .collect::<HashSet<_>>()
        };
        Self {
            ignored: compile(ignore),
            secured: compile(security),
        }
    }

    pub fn from_config(config: &MiddlewareConfig) -> Self {
        Self::new(&config.ignore_actions, &config.security_actions)
    }

    /// Calls that must produce no records at all.
    pub fn is_ignored(&self, verb: &str, path: &str) -> bool {
        !self.ignored.is_empty() && self.ignored.contains(&action_key(verb, path))
    }

    pub fn is_secured(&self, verb: &str, path: &str) -> bool {
        !self.secured.is_empty() && self.secured.contains(&action_key(verb, path))
    }

    /// Body to record for this call. A secured call always yields the
    /// sentinel, whether or not a body was captured.
    pub fn apply_redaction(&self, verb: &str, path: &str, body: Option<String>) -> Option<String> {
        if self.is_secured(verb, path) {
            Some(REDACTED_BODY.to_string())
        } else {
            body
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ActionPolicy {
        ActionPolicy::new(
            &[ActionRule::new("get", "/Health")],
            &[ActionRule::new("POST", "/test/secret"), ActionRule::new("RPC", "/auth.Login/SignIn")],
        )
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let policy = policy();
        assert!(policy.is_ignored("GET", "/health"));
        assert!(policy.is_ignored("get", "/HEALTH"));
        assert!(!policy.is_ignored("POST", "/health"));
        assert!(!policy.is_ignored("GET", "/health/live"));
    }

    #[test]
    fn test_redaction_replaces_body() {
        let policy = policy();
        assert_eq!(
            policy.apply_redaction("post", "/TEST/SECRET", Some("{\"password\":\"x\"}".into())),
            Some(REDACTED_BODY.to_string())
        );
        assert_eq!(
            policy.apply_redaction("RPC", "/auth.login/signin", None),
            Some(REDACTED_BODY.to_string())
        );
        assert_eq!(
            policy.apply_redaction("POST", "/test", Some("plain".into())),
            Some("plain".to_string())
        );
    }

    #[test]
    fn test_empty_policy_matches_nothing() {
        let policy = ActionPolicy::default();
        assert!(!policy.is_ignored("GET", "/"));
        assert_eq!(policy.apply_redaction("GET", "/", None), None);
    }
}
