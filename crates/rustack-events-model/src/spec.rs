//! The user-authored routing specification.
//!
//! These types mirror the input document field for field. They are
//! deliberately permissive (optional variant fields, free-form strings) so
//! that every defect can be reported as a diagnostic by the validator instead
//! of failing deserialization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::alarm::{AlarmSpec, AnomalyAlarmSpec, DeadLetterAlarmSpec};
use crate::keys::DEFAULT_BUS;
use crate::toggles::ObservabilityToggles;
use crate::types::AuthorizationType;

/// Root of the input document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRoutingSpec {
    /// Event buses with their rules and targets.
    pub buses: Vec<BusSpec>,
    /// Standard metric alarms keyed by alarm key.
    pub alarms: BTreeMap<String, AlarmSpec>,
    /// Anomaly-detection alarms keyed by alarm key.
    pub anomaly_alarms: BTreeMap<String, AnomalyAlarmSpec>,
    /// Dead-letter queue alarms keyed by alarm key.
    pub dead_letter_alarms: BTreeMap<String, DeadLetterAlarmSpec>,
    /// Feature toggles for synthesized observability resources.
    pub observability: ObservabilityToggles,
    /// Event archives keyed by archive name.
    pub archives: BTreeMap<String, ArchiveSpec>,
    /// Cross-account bus policies keyed by an arbitrary key.
    pub permissions: BTreeMap<String, PermissionSpec>,
    /// API destination connections keyed by connection name.
    pub connections: BTreeMap<String, ConnectionSpec>,
    /// API destinations keyed by destination name.
    pub api_destinations: BTreeMap<String, ApiDestinationSpec>,
}

/// An event bus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusSpec {
    /// Bus name. `default` attaches rules to the account's default bus.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    /// Protect the bus from accidental removal by the provisioner.
    #[serde(default)]
    pub prevent_destroy: bool,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

/// A rule attached to one bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Event pattern as JSON text. Mutually exclusive with
    /// `schedule_expression`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_pattern: Option<String>,
    /// `rate(...)` or `cron(...)`. Only valid on the default bus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
    #[serde(default)]
    pub targets: Vec<TargetSpec>,
}

impl Default for RuleSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            enabled: true,
            event_pattern: None,
            schedule_expression: None,
            role_arn: None,
            targets: Vec::new(),
        }
    }
}

/// A delivery destination attached to one rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub id: String,
    /// Destination ARN.
    pub arn: String,
    /// Static JSON payload delivered instead of the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// JSON path selecting part of the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_transformer: Option<InputTransformerSpec>,
    /// SQS queue receiving events that could not be delivered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dead_letter_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
    /// Synthesize a Lambda invoke permission for this target.
    #[serde(default)]
    pub attach_lambda_permission: bool,
}

/// Template-based reshaping of the delivered event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputTransformerSpec {
    /// Variable name to JSON path.
    #[serde(default)]
    pub input_paths: BTreeMap<String, String>,
    pub input_template: String,
}

/// Delivery retry bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_event_age_in_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_retry_attempts: Option<u32>,
}

/// An event archive on one bus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveSpec {
    pub source_bus: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_pattern: Option<String>,
    /// Zero keeps events indefinitely.
    #[serde(default)]
    pub retention_days: u32,
}

/// A resource-policy statement allowing another principal to put events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSpec {
    #[serde(default = "default_bus")]
    pub bus: String,
    /// 12-digit account ID or `*` (requires `organization_id`).
    pub principal: String,
    pub statement_id: String,
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

impl Default for PermissionSpec {
    fn default() -> Self {
        Self {
            bus: default_bus(),
            principal: String::new(),
            statement_id: String::new(),
            action: default_action(),
            organization_id: None,
        }
    }
}

/// Credentials for API destinations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub authorization_type: AuthorizationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic: Option<BasicAuthSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<ApiKeyAuthSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth: Option<OAuthSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuthSpec {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyAuthSpec {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthSpec {
    pub authorization_endpoint: String,
    #[serde(default = "default_method")]
    pub http_method: String,
    pub client_id: String,
    pub client_secret: String,
}

/// An HTTP endpoint invoked through a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDestinationSpec {
    /// Connection name.
    pub connection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub invocation_endpoint: String,
    #[serde(default = "default_method")]
    pub http_method: String,
    #[serde(default = "default_rate_limit")]
    pub invocation_rate_limit_per_second: u32,
}

impl Default for ApiDestinationSpec {
    fn default() -> Self {
        Self {
            connection: String::new(),
            description: None,
            invocation_endpoint: String::new(),
            http_method: default_method(),
            invocation_rate_limit_per_second: default_rate_limit(),
        }
    }
}

pub(crate) fn default_true() -> bool {
    true
}

fn default_bus() -> String {
    DEFAULT_BUS.to_owned()
}

fn default_action() -> String {
    "events:PutEvents".to_owned()
}

fn default_method() -> String {
    "POST".to_owned()
}

fn default_rate_limit() -> u32 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_deserialize_minimal_document() {
        let spec: EventRoutingSpec = serde_json::from_str(
            r#"{
                "buses": [{
                    "name": "orders",
                    "rules": [{
                        "name": "created",
                        "event_pattern": "{\"source\":[\"shop\"]}",
                        "targets": [{"id": "q", "arn": "arn:aws:sqs:us-east-1:123456789012:q"}]
                    }]
                }]
            }"#,
        )
        .unwrap();

        let rule = &spec.buses[0].rules[0];
        assert!(rule.enabled);
        assert!(!spec.buses[0].prevent_destroy);
        assert_eq!(rule.targets[0].id, "q");
        assert!(!rule.targets[0].attach_lambda_permission);
        assert!(!spec.observability.enabled);
        assert!(spec.alarms.is_empty());
    }

    #[test]
    fn test_should_apply_permission_defaults() {
        let p: PermissionSpec =
            serde_json::from_str(r#"{"principal": "123456789012", "statement_id": "s"}"#).unwrap();
        assert_eq!(p.bus, "default");
        assert_eq!(p.action, "events:PutEvents");
    }
}
