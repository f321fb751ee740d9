//! Feature toggles for synthesized observability resources.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Switches and defaults for synthesized alarms, log routes, and the
/// dashboard.
///
/// `enabled` is the master switch: when it is `false` nothing is synthesized
/// regardless of the per-category toggles.
///
/// # Examples
///
/// ```
/// use rustack_events_model::ObservabilityToggles;
///
/// let toggles = ObservabilityToggles::builder().enabled(true).build();
/// assert!(toggles.rule_failure_alarms);
/// assert!(!toggles.catch_all_logging);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(default)]
pub struct ObservabilityToggles {
    /// Master switch.
    #[builder(default = false)]
    pub enabled: bool,
    /// One `FailedInvocations` alarm per rule.
    #[builder(default = true)]
    pub rule_failure_alarms: bool,
    /// One `ThrottledRules` alarm per bus carrying rules.
    #[builder(default = true)]
    pub throttle_alarms: bool,
    /// One queue-depth alarm per target with a dead-letter queue.
    #[builder(default = true)]
    pub dead_letter_alarms: bool,
    /// A catch-all rule delivering every event of each bus to a log group.
    #[builder(default = false)]
    pub catch_all_logging: bool,
    /// Generate a CloudWatch dashboard.
    #[builder(default = true)]
    pub dashboard: bool,
    /// Lambda invoke permissions for targets asking for them. Not gated by
    /// the master switch.
    #[builder(default = true)]
    pub invocation_permissions: bool,
    /// Retention of catch-all log groups, in days.
    #[builder(default = 14)]
    pub log_retention_days: u32,
    /// Fraction of events forwarded to catch-all log groups.
    #[builder(default = 1.0)]
    pub log_sampling_rate: f64,
    #[builder(default = 1.0)]
    pub failed_invocations_threshold: f64,
    #[builder(default = 1.0)]
    pub throttled_rules_threshold: f64,
    #[builder(default = 0.0)]
    pub dead_letter_threshold: f64,
    /// Evaluation periods of synthesized alarms.
    #[builder(default = 1)]
    pub evaluation_periods: u32,
    /// Period of synthesized alarms, in seconds.
    #[builder(default = 300)]
    pub period: u32,
    /// Actions notified when a synthesized alarm fires.
    #[builder(default)]
    pub alarm_actions: Vec<String>,
    /// Actions notified when a synthesized alarm recovers.
    #[builder(default)]
    pub ok_actions: Vec<String>,
}

impl Default for ObservabilityToggles {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ObservabilityToggles {
    /// Whether synthesis of a category is on, taking the master switch into
    /// account.
    #[must_use]
    pub fn synthesizes(&self, category: bool) -> bool {
        self.enabled && category
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_default_to_disabled_master_switch() {
        let toggles = ObservabilityToggles::default();
        assert!(!toggles.enabled);
        assert!(toggles.rule_failure_alarms);
        assert!(!toggles.synthesizes(toggles.rule_failure_alarms));
        assert_eq!(toggles.log_retention_days, 14);
        assert_eq!(toggles.period, 300);
    }

    #[test]
    fn test_should_fill_missing_fields_from_defaults() {
        let toggles: ObservabilityToggles =
            serde_json::from_str(r#"{"enabled": true, "throttle_alarms": false}"#).unwrap();
        assert!(toggles.synthesizes(toggles.rule_failure_alarms));
        assert!(!toggles.synthesizes(toggles.throttle_alarms));
        assert!((toggles.log_sampling_rate - 1.0).abs() < f64::EPSILON);
    }
}
