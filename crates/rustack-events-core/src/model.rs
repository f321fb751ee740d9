//! The validated specification.
//!
//! Produced only by [`crate::validation::validate`]. Variant fields are sum
//! types and every ARN is parsed, so later stages never re-check what the
//! validator already guaranteed.

use std::collections::BTreeMap;

use rustack_core::Arn;
use rustack_events_model::alarm::{AlarmSpec, AnomalyAlarmSpec, DeadLetterAlarmSpec};
use rustack_events_model::toggles::ObservabilityToggles;
use rustack_events_model::types::{
    ConnectionAuth, RetryPolicy, RuleState, RuleTrigger, TargetInput,
};

/// A specification that passed every structural and semantic check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedSpec {
    pub buses: Vec<Bus>,
    pub alarms: BTreeMap<String, AlarmSpec>,
    pub anomaly_alarms: BTreeMap<String, AnomalyAlarmSpec>,
    pub dead_letter_alarms: BTreeMap<String, DeadLetterAlarmSpec>,
    pub observability: ObservabilityToggles,
    pub archives: BTreeMap<String, Archive>,
    pub permissions: BTreeMap<String, Permission>,
    pub connections: BTreeMap<String, Connection>,
    pub api_destinations: BTreeMap<String, ApiDestination>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bus {
    pub name: String,
    pub description: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub prevent_destroy: bool,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub description: Option<String>,
    pub state: RuleState,
    pub trigger: RuleTrigger,
    pub role_arn: Option<Arn>,
    pub targets: Vec<Target>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub id: String,
    pub arn: Arn,
    pub input: TargetInput,
    /// Always an SQS queue ARN.
    pub dead_letter_arn: Option<Arn>,
    pub retry_policy: Option<RetryPolicy>,
    pub role_arn: Option<Arn>,
    /// Only set for Lambda function destinations.
    pub attach_lambda_permission: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Archive {
    pub name: String,
    pub source_bus: String,
    pub description: Option<String>,
    pub event_pattern: Option<serde_json::Value>,
    pub retention_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub bus: String,
    pub statement_id: String,
    pub principal: String,
    pub action: String,
    pub organization_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub name: String,
    pub description: Option<String>,
    pub auth: ConnectionAuth,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiDestination {
    pub name: String,
    pub connection: String,
    pub description: Option<String>,
    pub invocation_endpoint: String,
    pub http_method: String,
    pub invocation_rate_limit_per_second: u32,
}
