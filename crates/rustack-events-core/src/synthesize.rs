//! Default observability resources.
//!
//! Synthesis is driven by [`ObservabilityToggles`]: the master switch gates
//! every alarm, log route, and the dashboard; each category can be turned
//! off on its own. Lambda invoke permissions only honour their own toggle.
//!
//! Every synthesized object has a deterministic key derived from the
//! composite key of the entity it watches, so a user object under the same
//! key replaces it in [`crate::merge`].

use std::collections::BTreeMap;

use rustack_events_model::alarm::{
    AlarmActions, AlarmSpec, ComparisonOperator, DeadLetterAlarmSpec, Evaluation,
    TreatMissingData,
};
use rustack_events_model::keys::{RuleKey, TargetKey};
use rustack_events_model::output::{LambdaPermission, LogRoute};
use rustack_events_model::ObservabilityToggles;
use tracing::debug;

use crate::config::CompilerConfig;
use crate::flatten::{FlatModel, rule_arn};
use crate::naming;
use crate::resolve::EVENT_BUS_NAME_DIMENSION;

/// Name of the synthesized catch-all rule on each bus.
pub const CATCH_ALL_RULE: &str = "catch-all";

/// Principal EventBridge invokes Lambda functions as.
pub const EVENTS_PRINCIPAL: &str = "events.amazonaws.com";

/// Action granted by synthesized Lambda permissions.
pub const INVOKE_FUNCTION_ACTION: &str = "lambda:InvokeFunction";

/// EventBridge metric counting failed target invocations.
pub const FAILED_INVOCATIONS_METRIC: &str = "FailedInvocations";

/// EventBridge metric counting throttled rule invocations.
pub const THROTTLED_RULES_METRIC: &str = "ThrottledRules";

/// Maximum Lambda permission statement id length.
const MAX_STATEMENT_ID_LEN: usize = 100;
/// `-` plus the key digest.
const STATEMENT_DIGEST_LEN: usize = 17;

/// Key of the failed-invocation alarm of `rule`.
#[must_use]
pub fn failed_invocations_key(rule: &RuleKey) -> String {
    format!("failed_invocations_{rule}")
}

/// Key of the throttled-rules alarm of `bus`.
#[must_use]
pub fn throttled_rules_key(bus: &str) -> String {
    format!("throttled_rules_{bus}")
}

/// Key of the dead-letter alarm of `target`.
#[must_use]
pub fn dead_letter_key(target: &TargetKey) -> String {
    format!("dead_letter_{target}")
}

/// Key of the catch-all log route of `bus`.
#[must_use]
pub fn catch_all_key(bus: &str) -> String {
    format!("catch_all_{bus}")
}

/// Log group receiving the catch-all route of `bus`.
#[must_use]
pub fn log_group_name(bus: &str) -> String {
    format!("/aws/events/{bus}")
}

/// Objects generated from feature toggles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Synthesized {
    pub alarms: BTreeMap<String, AlarmSpec>,
    pub dead_letter_alarms: BTreeMap<String, DeadLetterAlarmSpec>,
    pub log_routes: BTreeMap<String, LogRoute>,
    pub lambda_permissions: BTreeMap<TargetKey, LambdaPermission>,
}

/// Generate the default objects for a flattened model.
#[must_use]
pub fn synthesize(
    flat: &FlatModel,
    toggles: &ObservabilityToggles,
    config: &CompilerConfig,
) -> Synthesized {
    let mut out = Synthesized::default();

    if toggles.synthesizes(toggles.rule_failure_alarms) {
        failed_invocation_alarms(flat, toggles, &mut out.alarms);
    }
    if toggles.synthesizes(toggles.throttle_alarms) {
        throttle_alarms(flat, toggles, &mut out.alarms);
    }
    if toggles.synthesizes(toggles.dead_letter_alarms) {
        dead_letter_alarms(flat, toggles, &mut out.dead_letter_alarms);
    }
    if toggles.synthesizes(toggles.catch_all_logging) {
        catch_all_routes(flat, toggles, config, &mut out.log_routes);
    }
    if toggles.invocation_permissions {
        lambda_permissions(flat, &mut out.lambda_permissions);
    }

    debug!(
        alarms = out.alarms.len(),
        dead_letter_alarms = out.dead_letter_alarms.len(),
        log_routes = out.log_routes.len(),
        lambda_permissions = out.lambda_permissions.len(),
        "synthesized default resources"
    );
    out
}

/// Missing data never breaches, so quiet rules do not alarm.
fn evaluation(toggles: &ObservabilityToggles) -> Evaluation {
    Evaluation {
        evaluation_periods: toggles.evaluation_periods,
        datapoints_to_alarm: None,
        period: toggles.period,
        treat_missing_data: Some(TreatMissingData::NotBreaching),
    }
}

fn actions(toggles: &ObservabilityToggles) -> AlarmActions {
    AlarmActions {
        alarm_actions: toggles.alarm_actions.clone(),
        ok_actions: toggles.ok_actions.clone(),
    }
}

fn failed_invocation_alarms(
    flat: &FlatModel,
    toggles: &ObservabilityToggles,
    alarms: &mut BTreeMap<String, AlarmSpec>,
) {
    for key in flat.rules.keys() {
        let mut alarm = AlarmSpec::new(
            FAILED_INVOCATIONS_METRIC,
            ComparisonOperator::GreaterThanOrEqualToThreshold,
            toggles.failed_invocations_threshold,
        );
        alarm.description = Some(format!("Failed invocations of rule {key}"));
        alarm.rule_key = Some(key.to_string());
        alarm.evaluation = evaluation(toggles);
        alarm.actions = actions(toggles);
        alarms.insert(failed_invocations_key(key), alarm);
    }
}

fn throttle_alarms(
    flat: &FlatModel,
    toggles: &ObservabilityToggles,
    alarms: &mut BTreeMap<String, AlarmSpec>,
) {
    for bus in flat.buses.values() {
        if flat.rules_on(&bus.name).next().is_none() {
            continue;
        }
        let mut alarm = AlarmSpec::new(
            THROTTLED_RULES_METRIC,
            ComparisonOperator::GreaterThanOrEqualToThreshold,
            toggles.throttled_rules_threshold,
        );
        alarm.description = Some(format!("Throttled rules on bus {}", bus.name));
        // the default bus reports account-level metrics
        if bus.managed {
            alarm
                .dimensions
                .insert(EVENT_BUS_NAME_DIMENSION.to_owned(), bus.name.clone());
        }
        alarm.evaluation = evaluation(toggles);
        alarm.actions = actions(toggles);
        alarms.insert(throttled_rules_key(&bus.name), alarm);
    }
}

fn dead_letter_alarms(
    flat: &FlatModel,
    toggles: &ObservabilityToggles,
    alarms: &mut BTreeMap<String, DeadLetterAlarmSpec>,
) {
    for (key, target) in &flat.targets {
        if target.dead_letter_arn.is_none() {
            continue;
        }
        // queue name is left to the resolver
        let alarm = DeadLetterAlarmSpec {
            description: Some(format!("Undelivered events of target {key}")),
            target_key: Some(key.to_string()),
            threshold: toggles.dead_letter_threshold,
            evaluation: evaluation(toggles),
            actions: actions(toggles),
            ..DeadLetterAlarmSpec::default()
        };
        alarms.insert(dead_letter_key(key), alarm);
    }
}

fn catch_all_routes(
    flat: &FlatModel,
    toggles: &ObservabilityToggles,
    config: &CompilerConfig,
    routes: &mut BTreeMap<String, LogRoute>,
) {
    for bus in flat.buses.values() {
        if !bus.managed && flat.rules_on(&bus.name).next().is_none() {
            continue;
        }
        let log_group = log_group_name(&bus.name);
        routes.insert(
            catch_all_key(&bus.name),
            LogRoute {
                bus: bus.name.clone(),
                rule_name: CATCH_ALL_RULE.to_owned(),
                rule_arn: rule_arn(config, &RuleKey::new(&bus.name, CATCH_ALL_RULE)),
                event_pattern: serde_json::json!({ "account": [config.account_id.as_str()] }),
                log_group_arn: config.arn("logs", format!("log-group:{log_group}")),
                log_group_name: log_group,
                retention_days: toggles.log_retention_days,
                sampling_rate: toggles.log_sampling_rate,
            },
        );
    }
}

/// Statement id of the invoke permission for `key`.
///
/// Sanitizing folds `.` and `/` into the `-` separator, so the readable part
/// alone is ambiguous; the digest of the raw key keeps ids distinct.
fn statement_id(key: &TargetKey) -> String {
    let readable = naming::sanitized(
        &format!(
            "AllowEventBridge-{}-{}-{}",
            key.bus(),
            key.rule_key().rule(),
            key.target()
        ),
        MAX_STATEMENT_ID_LEN - STATEMENT_DIGEST_LEN,
    );
    format!("{readable}-{}", naming::digest(&key.to_string()))
}

fn lambda_permissions(flat: &FlatModel, permissions: &mut BTreeMap<TargetKey, LambdaPermission>) {
    for key in &flat.lambda_permission_requests {
        let (Some(target), Some(rule)) = (flat.targets.get(key), flat.rules.get(key.rule_key()))
        else {
            continue;
        };
        let statement_id = statement_id(key);
        permissions.insert(
            key.clone(),
            LambdaPermission {
                statement_id,
                function_arn: target.arn.clone(),
                principal: EVENTS_PRINCIPAL.to_owned(),
                action: INVOKE_FUNCTION_ACTION.to_owned(),
                source_arn: rule.arn.clone(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use rustack_events_model::keys::DEFAULT_BUS;
    use rustack_events_model::output::{BusRef, ResolvedRule, ResolvedTarget};
    use rustack_events_model::types::{RuleState, RuleTrigger, TargetInput};

    use super::*;
    use crate::flatten::bus_arn;

    fn flat_model(config: &CompilerConfig) -> FlatModel {
        let mut flat = FlatModel::default();
        for (name, managed) in [("A", true), ("B", true), (DEFAULT_BUS, false)] {
            flat.buses.insert(name.to_owned(), BusRef {
                name: name.to_owned(),
                arn: bus_arn(config, name),
                managed,
                prevent_destroy: false,
                description: None,
                tags: BTreeMap::new(),
            });
        }
        let key = RuleKey::new("A", "r1");
        flat.rules.insert(key.clone(), ResolvedRule {
            name: "r1".to_owned(),
            bus: "A".to_owned(),
            arn: rule_arn(config, &key),
            state: RuleState::Enabled,
            trigger: RuleTrigger::Pattern {
                pattern: serde_json::json!({"source": ["shop"]}),
            },
            description: None,
            role_arn: None,
        });
        for (id, arn, dlq) in [
            (
                "t1",
                "arn:aws:sqs:us-east-1:123456789012:orders",
                Some("arn:aws:sqs:us-east-1:123456789012:orders-dlq"),
            ),
            (
                "fn",
                "arn:aws:lambda:us-east-1:123456789012:function:audit",
                None,
            ),
        ] {
            flat.targets.insert(key.target(id), ResolvedTarget {
                id: id.to_owned(),
                rule: key.clone(),
                arn: arn.parse().unwrap(),
                input: TargetInput::Matched,
                dead_letter_arn: dlq.map(|a| a.parse().unwrap()),
                retry_policy: None,
                role_arn: None,
            });
        }
        flat.lambda_permission_requests.insert(key.target("fn"));
        flat
    }

    fn all_on() -> ObservabilityToggles {
        ObservabilityToggles::builder()
            .enabled(true)
            .catch_all_logging(true)
            .build()
    }

    #[test]
    fn test_should_synthesize_nothing_but_permissions_when_master_switch_is_off() {
        let config = CompilerConfig::default();
        let out = synthesize(&flat_model(&config), &ObservabilityToggles::default(), &config);
        assert!(out.alarms.is_empty());
        assert!(out.dead_letter_alarms.is_empty());
        assert!(out.log_routes.is_empty());
        assert_eq!(out.lambda_permissions.len(), 1);
    }

    #[test]
    fn test_should_synthesize_deterministic_keys() {
        let config = CompilerConfig::default();
        let out = synthesize(&flat_model(&config), &all_on(), &config);

        assert_eq!(
            out.alarms.keys().collect::<Vec<_>>(),
            vec!["failed_invocations_A:r1", "throttled_rules_A"]
        );
        assert_eq!(
            out.dead_letter_alarms.keys().collect::<Vec<_>>(),
            vec!["dead_letter_A:r1:t1"]
        );
        assert_eq!(
            out.log_routes.keys().collect::<Vec<_>>(),
            vec!["catch_all_A", "catch_all_B"]
        );
    }

    #[test]
    fn test_should_treat_missing_data_as_not_breaching() {
        let config = CompilerConfig::default();
        let out = synthesize(&flat_model(&config), &all_on(), &config);

        let failed = &out.alarms["failed_invocations_A:r1"];
        assert_eq!(failed.metric_name, "FailedInvocations");
        assert_eq!(failed.rule_key.as_deref(), Some("A:r1"));
        assert!(failed.dimensions.is_empty());
        assert_eq!(
            failed.evaluation.treat_missing_data,
            Some(TreatMissingData::NotBreaching)
        );

        let dlq = &out.dead_letter_alarms["dead_letter_A:r1:t1"];
        assert_eq!(dlq.target_key.as_deref(), Some("A:r1:t1"));
        assert!(dlq.queue_name.is_none());
        assert_eq!(
            dlq.evaluation.treat_missing_data,
            Some(TreatMissingData::NotBreaching)
        );
    }

    #[test]
    fn test_should_honour_category_toggles() {
        let config = CompilerConfig::default();
        let toggles = ObservabilityToggles::builder()
            .enabled(true)
            .rule_failure_alarms(false)
            .dead_letter_alarms(false)
            .invocation_permissions(false)
            .build();
        let out = synthesize(&flat_model(&config), &toggles, &config);
        assert_eq!(
            out.alarms.keys().collect::<Vec<_>>(),
            vec!["throttled_rules_A"]
        );
        assert!(out.dead_letter_alarms.is_empty());
        assert!(out.log_routes.is_empty());
        assert!(out.lambda_permissions.is_empty());
    }

    #[test]
    fn test_should_build_catch_all_route() {
        let config = CompilerConfig::default();
        let out = synthesize(&flat_model(&config), &all_on(), &config);
        let route = &out.log_routes["catch_all_A"];
        assert_eq!(route.log_group_name, "/aws/events/A");
        assert_eq!(
            route.log_group_arn.to_string(),
            "arn:aws:logs:us-east-1:000000000000:log-group:/aws/events/A"
        );
        assert_eq!(
            route.rule_arn.to_string(),
            "arn:aws:events:us-east-1:000000000000:rule/A/catch-all"
        );
        assert_eq!(route.retention_days, 14);
        assert_eq!(route.event_pattern["account"][0], "000000000000");
    }

    #[test]
    fn test_should_grant_invoke_permission_to_flagged_functions() {
        let config = CompilerConfig::default();
        let out = synthesize(&flat_model(&config), &all_on(), &config);
        let permission = &out.lambda_permissions[&TargetKey::new("A", "r1", "fn")];
        assert!(permission.statement_id.starts_with("AllowEventBridge-A-r1-fn-"));
        assert_eq!(permission.statement_id.len(), "AllowEventBridge-A-r1-fn-".len() + 16);
        assert_eq!(permission.principal, EVENTS_PRINCIPAL);
        assert_eq!(
            permission.source_arn.to_string(),
            "arn:aws:events:us-east-1:000000000000:rule/A/r1"
        );
    }

    #[test]
    fn test_should_keep_statement_ids_distinct_for_ambiguous_keys() {
        let pairs = [
            (TargetKey::new("A", "a.b", "fn"), TargetKey::new("A", "a-b", "fn")),
            (TargetKey::new("a-b", "c", "fn"), TargetKey::new("a", "b-c", "fn")),
        ];
        for (left, right) in pairs {
            let (l, r) = (statement_id(&left), statement_id(&right));
            assert_ne!(l, r);
            assert!(l.len() <= MAX_STATEMENT_ID_LEN);
        }
        let long = TargetKey::new(&"b".repeat(200), "r", "fn");
        assert_eq!(statement_id(&long).len(), MAX_STATEMENT_ID_LEN);
        assert_eq!(statement_id(&long), statement_id(&long));
    }
}
