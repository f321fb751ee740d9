//! The resolved resource graph handed to the provisioner.
//!
//! Every collection is a `BTreeMap` keyed by a stable identifier (bus name,
//! composite key, alarm key), so serializing the same graph twice yields
//! byte-identical JSON and the provisioner can diff by key.

use std::collections::BTreeMap;

use rustack_core::Arn;
use serde::Serialize;

use crate::alarm::{ComparisonOperator, Statistic, TreatMissingData};
use crate::keys::{RuleKey, TargetKey};
use crate::types::{ConnectionAuth, Origin, RetryPolicy, RuleState, RuleTrigger, TargetInput};

/// A bus as seen by rules, archives, and policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusRef {
    pub name: String,
    pub arn: Arn,
    /// `false` for the default bus, which exists in every account and is never
    /// created or deleted.
    pub managed: bool,
    pub prevent_destroy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRule {
    pub name: String,
    pub bus: String,
    pub arn: Arn,
    pub state: RuleState,
    pub trigger: RuleTrigger,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<Arn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedTarget {
    pub id: String,
    pub rule: RuleKey,
    pub arn: Arn,
    pub input: TargetInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dead_letter_arn: Option<Arn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_policy: Option<RetryPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<Arn>,
}

/// A threshold alarm (standard or dead-letter) with every field resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedAlarm {
    pub alarm_name: String,
    pub arn: Arn,
    pub origin: Origin,
    /// Bus the alarm watches. Account-level alarms belong to the default bus.
    pub bus: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_key: Option<RuleKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_key: Option<TargetKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub namespace: String,
    pub metric_name: String,
    pub statistic: Statistic,
    pub comparison_operator: ComparisonOperator,
    pub threshold: f64,
    pub evaluation_periods: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datapoints_to_alarm: Option<u32>,
    pub period: u32,
    pub treat_missing_data: TreatMissingData,
    pub dimensions: BTreeMap<String, String>,
    pub alarm_actions: Vec<String>,
    pub ok_actions: Vec<String>,
}

/// An anomaly-detection alarm with every field resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedAnomalyAlarm {
    pub alarm_name: String,
    pub arn: Arn,
    pub origin: Origin,
    pub bus: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_key: Option<RuleKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub namespace: String,
    pub metric_name: String,
    pub statistic: Statistic,
    pub comparison_operator: ComparisonOperator,
    pub band_width: f64,
    pub evaluation_periods: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datapoints_to_alarm: Option<u32>,
    pub period: u32,
    pub treat_missing_data: TreatMissingData,
    pub dimensions: BTreeMap<String, String>,
    pub alarm_actions: Vec<String>,
    pub ok_actions: Vec<String>,
}

/// Catch-all rule delivering every event of a bus to a log group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRoute {
    pub bus: String,
    pub rule_name: String,
    pub rule_arn: Arn,
    pub event_pattern: serde_json::Value,
    pub log_group_name: String,
    pub log_group_arn: Arn,
    pub retention_days: u32,
    pub sampling_rate: f64,
}

/// Resource-policy statement letting EventBridge invoke a Lambda function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LambdaPermission {
    pub statement_id: String,
    pub function_arn: Arn,
    pub principal: String,
    pub action: String,
    pub source_arn: Arn,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedArchive {
    pub name: String,
    pub arn: Arn,
    pub source_bus_arn: Arn,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_pattern: Option<serde_json::Value>,
    pub retention_days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPermission {
    pub bus: String,
    pub statement_id: String,
    pub principal: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConnection {
    pub name: String,
    pub arn: Arn,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub auth: ConnectionAuth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedApiDestination {
    pub name: String,
    pub arn: Arn,
    pub connection_arn: Arn,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub invocation_endpoint: String,
    pub http_method: String,
    pub invocation_rate_limit_per_second: u32,
}

/// A CloudWatch dashboard derived from the resolved graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub name: String,
    pub widgets: Vec<Widget>,
}

impl Dashboard {
    /// The dashboard body document (`{"widgets": [...]}`).
    #[must_use]
    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({ "widgets": self.widgets })
    }
}

/// A positioned dashboard widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Widget {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(flatten)]
    pub body: WidgetBody,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "properties", rename_all = "lowercase")]
pub enum WidgetBody {
    Text(TextWidget),
    Metric(MetricWidget),
    Alarm(AlarmWidget),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextWidget {
    pub markdown: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricWidget {
    pub title: String,
    pub region: String,
    /// `[namespace, metric, dimension, value, ...]` rows.
    pub metrics: Vec<Vec<String>>,
    pub stat: Statistic,
    pub period: u32,
    pub view: String,
    pub stacked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlarmWidget {
    pub title: String,
    pub alarms: Vec<Arn>,
}

/// Counts describing the merged observability configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObservabilitySummary {
    /// Projected alarms that came from feature toggles.
    pub synthesized_alarms: usize,
    /// Projected alarms authored by the user under new keys.
    pub user_alarms: usize,
    /// Projected alarms authored by the user that replaced a default.
    pub overridden_alarms: usize,
    /// All projected alarms of every kind.
    pub total_alarms: usize,
    /// Whether a dashboard was generated.
    pub dashboard_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_name: Option<String>,
}

/// Everything the provisioner consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompiledOutput {
    pub buses: BTreeMap<String, BusRef>,
    pub rules: BTreeMap<RuleKey, ResolvedRule>,
    pub rule_arns: BTreeMap<RuleKey, Arn>,
    pub targets: BTreeMap<TargetKey, ResolvedTarget>,
    pub target_arns: BTreeMap<TargetKey, Arn>,
    pub alarms: BTreeMap<String, ResolvedAlarm>,
    pub anomaly_alarms: BTreeMap<String, ResolvedAnomalyAlarm>,
    pub dead_letter_alarms: BTreeMap<String, ResolvedAlarm>,
    pub log_routes: BTreeMap<String, LogRoute>,
    pub lambda_permissions: BTreeMap<TargetKey, LambdaPermission>,
    pub archives: BTreeMap<String, ResolvedArchive>,
    pub permissions: BTreeMap<String, ResolvedPermission>,
    pub connections: BTreeMap<String, ResolvedConnection>,
    pub api_destinations: BTreeMap<String, ResolvedApiDestination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<Dashboard>,
    pub summary: ObservabilitySummary,
}
