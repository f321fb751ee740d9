//! Resolution of sparse alarm fields through fallback chains.
//!
//! Runs on the merged alarm set, so user alarms and synthesized defaults go
//! through the same chains:
//!
//! | Field | Sources, in priority order |
//! |-------|----------------------------|
//! | dimensions | explicit `dimensions`; `RuleName` (+ `EventBusName` off the default bus) of `rule_key`; none |
//! | `QueueName` | `queue_name`; resource of `queue_arn`; resource of the `target_key` target's `dead_letter_arn` |
//! | alarm name | `alarm_name`; the alarm key |
//!
//! A source that is present but unusable fails closed instead of falling
//! through to the next one. Disabled alarms and alarms whose reference is
//! broken are skipped; the latter were already reported by
//! [`crate::crossref`].

use std::collections::BTreeMap;

use rustack_core::Arn;
use rustack_events_model::alarm::{
    AlarmActions, DEAD_LETTER_METRIC, DeadLetterAlarmSpec, Evaluation, SQS_NAMESPACE,
    TreatMissingData,
};
use rustack_events_model::keys::{DEFAULT_BUS, RuleKey, TargetKey};
use rustack_events_model::output::{ResolvedAlarm, ResolvedAnomalyAlarm, ResolvedTarget};
use rustack_events_model::types::Origin;
use rustack_events_model::Diagnostics;
use tracing::{debug, warn};

use crate::config::CompilerConfig;
use crate::flatten::FlatModel;
use crate::merge::MergedAlarms;
use crate::naming;
use crate::validation::MAX_ALARM_NAME_LEN;

/// Dimension naming the rule an EventBridge metric belongs to.
pub const RULE_NAME_DIMENSION: &str = "RuleName";

/// Dimension naming the bus of a custom-bus metric.
pub const EVENT_BUS_NAME_DIMENSION: &str = "EventBusName";

/// Dimension naming an SQS queue.
pub const QUEUE_NAME_DIMENSION: &str = "QueueName";

/// Why a dead-letter alarm has no queue name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueNameError {
    /// A source is present but is not a well-formed SQS queue ARN.
    #[error("{field} '{arn}' is not an SQS queue ARN")]
    NotAQueue { field: &'static str, arn: String },

    /// No source is present.
    #[error("set queue_name or queue_arn, or reference a target with a dead_letter_arn")]
    Unresolved,
}

/// Every enabled alarm with its fields resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedAlarms {
    pub alarms: BTreeMap<String, ResolvedAlarm>,
    pub anomaly_alarms: BTreeMap<String, ResolvedAnomalyAlarm>,
    pub dead_letter_alarms: BTreeMap<String, ResolvedAlarm>,
}

impl ResolvedAlarms {
    /// Origins of every resolved alarm of every kind.
    pub fn origins(&self) -> impl Iterator<Item = Origin> + '_ {
        self.alarms
            .values()
            .map(|a| a.origin)
            .chain(self.anomaly_alarms.values().map(|a| a.origin))
            .chain(self.dead_letter_alarms.values().map(|a| a.origin))
    }

    /// Total number of resolved alarms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.alarms.len() + self.anomaly_alarms.len() + self.dead_letter_alarms.len()
    }

    /// Whether no alarm was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dimensions of a standard or anomaly alarm.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use rustack_events_core::resolve::resolve_dimensions;
/// use rustack_events_model::RuleKey;
///
/// let dims = resolve_dimensions(&BTreeMap::new(), Some(&RuleKey::new("orders", "created")));
/// assert_eq!(dims["RuleName"], "created");
/// assert_eq!(dims["EventBusName"], "orders");
///
/// assert!(resolve_dimensions(&BTreeMap::new(), None).is_empty());
/// ```
#[must_use]
pub fn resolve_dimensions(
    explicit: &BTreeMap<String, String>,
    rule: Option<&RuleKey>,
) -> BTreeMap<String, String> {
    if !explicit.is_empty() {
        return explicit.clone();
    }
    let Some(rule) = rule else {
        return BTreeMap::new();
    };
    let mut dimensions = BTreeMap::from([(RULE_NAME_DIMENSION.to_owned(), rule.rule().to_owned())]);
    if !rule.is_default_bus() {
        dimensions.insert(EVENT_BUS_NAME_DIMENSION.to_owned(), rule.bus().to_owned());
    }
    dimensions
}

/// `QueueName` of a dead-letter alarm.
///
/// `target` is the target named by the alarm's `target_key`, if any.
pub fn resolve_queue_name(
    alarm: &DeadLetterAlarmSpec,
    target: Option<&ResolvedTarget>,
) -> Result<String, QueueNameError> {
    if let Some(name) = &alarm.queue_name {
        return Ok(name.clone());
    }
    if let Some(text) = &alarm.queue_arn {
        let not_a_queue = || QueueNameError::NotAQueue {
            field: "queue_arn",
            arn: text.clone(),
        };
        let arn: Arn = text.parse().map_err(|_| not_a_queue())?;
        return queue_of(&arn).ok_or_else(not_a_queue);
    }
    if let Some(arn) = target.and_then(|t| t.dead_letter_arn.as_ref()) {
        return queue_of(arn).ok_or_else(|| QueueNameError::NotAQueue {
            field: "dead_letter_arn",
            arn: arn.to_string(),
        });
    }
    Err(QueueNameError::Unresolved)
}

fn queue_of(arn: &Arn) -> Option<String> {
    (arn.service() == "sqs" && arn.resource_type().is_none()).then(|| arn.resource().to_owned())
}

/// Resolve every enabled merged alarm.
///
/// Also rejects alarm names used twice across all kinds, since CloudWatch
/// alarm names are unique per account and region.
#[must_use]
pub fn resolve(
    merged: &MergedAlarms,
    flat: &FlatModel,
    config: &CompilerConfig,
) -> (ResolvedAlarms, Diagnostics) {
    let mut resolver = Resolver {
        flat,
        config,
        names: BTreeMap::new(),
        diagnostics: Diagnostics::new(),
    };
    let mut out = ResolvedAlarms::default();

    for (key, entry) in &merged.alarms {
        let alarm = &entry.value;
        if !alarm.enabled {
            continue;
        }
        let Some(rule) = resolver.rule_ref(alarm.rule_key.as_deref()) else {
            continue;
        };
        let path = format!("alarms.{key}");
        let dimensions = resolve_dimensions(&alarm.dimensions, rule.as_ref());
        let name = resolver.alarm_name(&path, key, alarm.alarm_name.as_deref());
        let evaluation = &alarm.evaluation;
        out.alarms.insert(key.clone(), ResolvedAlarm {
            arn: resolver.alarm_arn(&name),
            alarm_name: name,
            origin: entry.origin,
            bus: resolver.bus_of(rule.as_ref(), None, &dimensions),
            rule_key: rule,
            target_key: None,
            description: alarm.description.clone(),
            namespace: alarm.namespace.clone(),
            metric_name: alarm.metric_name.clone(),
            statistic: alarm.statistic,
            comparison_operator: alarm.comparison_operator,
            threshold: alarm.threshold,
            evaluation_periods: evaluation.evaluation_periods,
            datapoints_to_alarm: evaluation.datapoints_to_alarm,
            period: evaluation.period,
            treat_missing_data: treat_missing_data(evaluation),
            dimensions,
            alarm_actions: alarm.actions.alarm_actions.clone(),
            ok_actions: alarm.actions.ok_actions.clone(),
        });
    }

    for (key, entry) in &merged.anomaly_alarms {
        let alarm = &entry.value;
        if !alarm.enabled {
            continue;
        }
        let Some(rule) = resolver.rule_ref(alarm.rule_key.as_deref()) else {
            continue;
        };
        let path = format!("anomaly_alarms.{key}");
        let dimensions = resolve_dimensions(&alarm.dimensions, rule.as_ref());
        let name = resolver.alarm_name(&path, key, alarm.alarm_name.as_deref());
        let evaluation = &alarm.evaluation;
        out.anomaly_alarms.insert(key.clone(), ResolvedAnomalyAlarm {
            arn: resolver.alarm_arn(&name),
            alarm_name: name,
            origin: entry.origin,
            bus: resolver.bus_of(rule.as_ref(), None, &dimensions),
            rule_key: rule,
            description: alarm.description.clone(),
            namespace: alarm.namespace.clone(),
            metric_name: alarm.metric_name.clone(),
            statistic: alarm.statistic,
            comparison_operator: alarm.comparison_operator,
            band_width: alarm.band_width,
            evaluation_periods: evaluation.evaluation_periods,
            datapoints_to_alarm: evaluation.datapoints_to_alarm,
            period: evaluation.period,
            treat_missing_data: treat_missing_data(evaluation),
            dimensions,
            alarm_actions: alarm.actions.alarm_actions.clone(),
            ok_actions: alarm.actions.ok_actions.clone(),
        });
    }

    for (key, entry) in &merged.dead_letter_alarms {
        let alarm = &entry.value;
        if !alarm.enabled {
            continue;
        }
        let target = match alarm.target_key.as_deref() {
            None => None,
            Some(raw) => match flat.lookup_target(raw) {
                Some(found) => Some(found),
                None => continue,
            },
        };
        let path = format!("dead_letter_alarms.{key}");
        let queue = match resolve_queue_name(alarm, target.as_ref().map(|(_, t)| *t)) {
            Ok(queue) => queue,
            Err(err) => {
                warn!(alarm = %key, error = %err, "dead-letter alarm has no queue name");
                resolver.diagnostics.resolution(
                    &path,
                    format!("cannot resolve QueueName of dead-letter alarm '{key}': {err}"),
                );
                continue;
            }
        };
        let target_key = target.map(|(k, _)| k);
        let name = resolver.alarm_name(&path, key, alarm.alarm_name.as_deref());
        out.dead_letter_alarms.insert(
            key.clone(),
            dead_letter_alarm(
                &resolver,
                alarm,
                entry.origin,
                name,
                queue,
                target_key,
            ),
        );
    }

    debug!(
        alarms = out.len(),
        diagnostics = resolver.diagnostics.len(),
        "resolved alarms"
    );
    (out, resolver.diagnostics)
}

fn dead_letter_alarm(
    resolver: &Resolver<'_>,
    alarm: &DeadLetterAlarmSpec,
    origin: Origin,
    name: String,
    queue: String,
    target_key: Option<TargetKey>,
) -> ResolvedAlarm {
    let evaluation = &alarm.evaluation;
    let dimensions = BTreeMap::from([(QUEUE_NAME_DIMENSION.to_owned(), queue)]);
    let AlarmActions {
        alarm_actions,
        ok_actions,
    } = alarm.actions.clone();
    ResolvedAlarm {
        arn: resolver.alarm_arn(&name),
        alarm_name: name,
        origin,
        bus: resolver.bus_of(None, target_key.as_ref(), &dimensions),
        rule_key: None,
        target_key,
        description: alarm.description.clone(),
        namespace: SQS_NAMESPACE.to_owned(),
        metric_name: DEAD_LETTER_METRIC.to_owned(),
        statistic: alarm.statistic,
        comparison_operator: alarm.comparison_operator,
        threshold: alarm.threshold,
        evaluation_periods: evaluation.evaluation_periods,
        datapoints_to_alarm: evaluation.datapoints_to_alarm,
        period: evaluation.period,
        treat_missing_data: treat_missing_data(evaluation),
        dimensions,
        alarm_actions,
        ok_actions,
    }
}

fn treat_missing_data(evaluation: &Evaluation) -> TreatMissingData {
    evaluation
        .treat_missing_data
        .unwrap_or(TreatMissingData::Missing)
}

struct Resolver<'a> {
    flat: &'a FlatModel,
    config: &'a CompilerConfig,
    /// Alarm name to the path of the alarm that claimed it.
    names: BTreeMap<String, String>,
    diagnostics: Diagnostics,
}

impl Resolver<'_> {
    /// `Some(None)` for no reference, `None` for a broken one.
    fn rule_ref(&self, raw: Option<&str>) -> Option<Option<RuleKey>> {
        match raw {
            None => Some(None),
            Some(raw) => self.flat.lookup_rule(raw).map(|(key, _)| Some(key)),
        }
    }

    fn alarm_name(&mut self, path: &str, key: &str, explicit: Option<&str>) -> String {
        let name = explicit.map_or_else(
            || naming::bounded(key, MAX_ALARM_NAME_LEN),
            ToOwned::to_owned,
        );
        if let Some(claimed) = self.names.get(&name) {
            self.diagnostics.structural(
                format!("{path}.alarm_name"),
                format!("alarm name '{name}' is already used by {claimed}"),
            );
        } else {
            self.names.insert(name.clone(), path.to_owned());
        }
        name
    }

    fn alarm_arn(&self, name: &str) -> Arn {
        self.config.arn("cloudwatch", format!("alarm:{name}"))
    }

    fn bus_of(
        &self,
        rule: Option<&RuleKey>,
        target: Option<&TargetKey>,
        dimensions: &BTreeMap<String, String>,
    ) -> String {
        rule.map(RuleKey::bus)
            .or_else(|| target.map(TargetKey::bus))
            .or_else(|| {
                dimensions
                    .get(EVENT_BUS_NAME_DIMENSION)
                    .map(String::as_str)
                    .filter(|bus| self.flat.buses.contains_key(*bus))
            })
            .unwrap_or(DEFAULT_BUS)
            .to_owned()
    }
}
