//! CloudWatch alarm declarations.
//!
//! Three kinds of alarm share the same evaluation and notification settings:
//! standard threshold alarms, anomaly-detection alarms, and dead-letter queue
//! alarms. All are keyed by an arbitrary alarm key; synthesized defaults use
//! deterministic keys such as `failed_invocations_<bus>:<rule>`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::spec::default_true;

/// Namespace of EventBridge metrics.
pub const EVENTS_NAMESPACE: &str = "AWS/Events";

/// Namespace of SQS metrics.
pub const SQS_NAMESPACE: &str = "AWS/SQS";

/// Metric watched by dead-letter queue alarms.
pub const DEAD_LETTER_METRIC: &str = "ApproximateNumberOfMessagesVisible";

/// Threshold comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    GreaterThanOrEqualToThreshold,
    GreaterThanThreshold,
    LessThanThreshold,
    LessThanOrEqualToThreshold,
    LessThanLowerOrGreaterThanUpperThreshold,
    LessThanLowerThreshold,
    GreaterThanUpperThreshold,
}

impl ComparisonOperator {
    /// Whether the operator compares against an anomaly detection band.
    #[must_use]
    pub fn is_band(&self) -> bool {
        matches!(
            self,
            Self::LessThanLowerOrGreaterThanUpperThreshold
                | Self::LessThanLowerThreshold
                | Self::GreaterThanUpperThreshold
        )
    }
}

/// Metric statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statistic {
    SampleCount,
    Average,
    Sum,
    Minimum,
    Maximum,
}

impl Statistic {
    /// Wire-format name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SampleCount => "SampleCount",
            Self::Average => "Average",
            Self::Sum => "Sum",
            Self::Minimum => "Minimum",
            Self::Maximum => "Maximum",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How periods without data are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreatMissingData {
    Breaching,
    NotBreaching,
    Ignore,
    Missing,
}

/// Evaluation window shared by every alarm kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(default = "default_evaluation_periods")]
    pub evaluation_periods: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datapoints_to_alarm: Option<u32>,
    /// Period in seconds: 10, 30, or a multiple of 60.
    #[serde(default = "default_period")]
    pub period: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treat_missing_data: Option<TreatMissingData>,
}

impl Default for Evaluation {
    fn default() -> Self {
        Self {
            evaluation_periods: default_evaluation_periods(),
            datapoints_to_alarm: None,
            period: default_period(),
            treat_missing_data: None,
        }
    }
}

/// Notification targets of an alarm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmActions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alarm_actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ok_actions: Vec<String>,
}

/// A standard threshold alarm.
///
/// Metric fields default so that a disabled entry (`{"enabled": false}`) is
/// enough to suppress a synthesized default of the same key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmSpec {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `<bus>:<rule>` whose dimensions are inherited when none are given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_key: Option<String>,
    #[serde(default = "default_events_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub metric_name: String,
    #[serde(default = "default_sum")]
    pub statistic: Statistic,
    #[serde(default = "default_threshold_operator")]
    pub comparison_operator: ComparisonOperator,
    #[serde(default)]
    pub threshold: f64,
    #[serde(flatten)]
    pub evaluation: Evaluation,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dimensions: BTreeMap<String, String>,
    #[serde(flatten)]
    pub actions: AlarmActions,
}

impl AlarmSpec {
    /// A threshold alarm on an EventBridge metric with default settings.
    #[must_use]
    pub fn new(
        metric_name: impl Into<String>,
        comparison_operator: ComparisonOperator,
        threshold: f64,
    ) -> Self {
        Self {
            enabled: true,
            alarm_name: None,
            description: None,
            rule_key: None,
            namespace: default_events_namespace(),
            metric_name: metric_name.into(),
            statistic: Statistic::Sum,
            comparison_operator,
            threshold,
            evaluation: Evaluation::default(),
            dimensions: BTreeMap::new(),
            actions: AlarmActions::default(),
        }
    }
}

/// An anomaly-detection alarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyAlarmSpec {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_key: Option<String>,
    #[serde(default = "default_events_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub metric_name: String,
    #[serde(default = "default_sum")]
    pub statistic: Statistic,
    #[serde(default = "default_band_operator")]
    pub comparison_operator: ComparisonOperator,
    /// Width of the expected band in standard deviations.
    #[serde(default = "default_band_width")]
    pub band_width: f64,
    #[serde(flatten)]
    pub evaluation: Evaluation,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dimensions: BTreeMap<String, String>,
    #[serde(flatten)]
    pub actions: AlarmActions,
}

impl AnomalyAlarmSpec {
    /// An anomaly alarm on an EventBridge metric with default settings.
    #[must_use]
    pub fn new(metric_name: impl Into<String>) -> Self {
        Self {
            enabled: true,
            alarm_name: None,
            description: None,
            rule_key: None,
            namespace: default_events_namespace(),
            metric_name: metric_name.into(),
            statistic: Statistic::Sum,
            comparison_operator: default_band_operator(),
            band_width: default_band_width(),
            evaluation: Evaluation::default(),
            dimensions: BTreeMap::new(),
            actions: AlarmActions::default(),
        }
    }
}

/// An alarm on the depth of a target's dead-letter queue.
///
/// The `QueueName` dimension is taken from `queue_name`, else from
/// `queue_arn`, else from the dead-letter ARN of the target named by
/// `target_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterAlarmSpec {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `<bus>:<rule>:<target>` whose dead-letter queue is watched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_arn: Option<String>,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default = "default_threshold_operator")]
    pub comparison_operator: ComparisonOperator,
    #[serde(default = "default_maximum")]
    pub statistic: Statistic,
    #[serde(flatten)]
    pub evaluation: Evaluation,
    #[serde(flatten)]
    pub actions: AlarmActions,
}

impl Default for DeadLetterAlarmSpec {
    fn default() -> Self {
        Self {
            enabled: true,
            alarm_name: None,
            description: None,
            target_key: None,
            queue_name: None,
            queue_arn: None,
            threshold: 0.0,
            comparison_operator: default_threshold_operator(),
            statistic: default_maximum(),
            evaluation: Evaluation::default(),
            actions: AlarmActions::default(),
        }
    }
}

fn default_evaluation_periods() -> u32 {
    1
}

fn default_period() -> u32 {
    300
}

fn default_events_namespace() -> String {
    EVENTS_NAMESPACE.to_owned()
}

fn default_sum() -> Statistic {
    Statistic::Sum
}

fn default_maximum() -> Statistic {
    Statistic::Maximum
}

fn default_band_operator() -> ComparisonOperator {
    ComparisonOperator::LessThanLowerOrGreaterThanUpperThreshold
}

fn default_band_width() -> f64 {
    2.0
}

fn default_threshold_operator() -> ComparisonOperator {
    ComparisonOperator::GreaterThanThreshold
}
