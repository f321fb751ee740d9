//! Flattening of the bus/rule/target tree.
//!
//! Every rule and target gets a composite key built from validated, unique
//! names, so a key never depends on the position of an entry in the input.
//! The distinguished default bus is always present as an unmanaged
//! reference, whether or not the document declares it.

use std::collections::{BTreeMap, BTreeSet};

use rustack_core::Arn;
use rustack_events_model::keys::{DEFAULT_BUS, RuleKey, TargetKey};
use rustack_events_model::output::{
    BusRef, ResolvedApiDestination, ResolvedArchive, ResolvedConnection, ResolvedPermission,
    ResolvedRule, ResolvedTarget,
};
use tracing::debug;

use crate::config::CompilerConfig;
use crate::model::ValidatedSpec;

/// Rules and targets grouped back by bus and rule name.
pub type Renested = BTreeMap<String, BTreeMap<String, BTreeSet<String>>>;

/// Flat collections addressed by composite key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatModel {
    /// Every bus by name, including the implicit default bus.
    pub buses: BTreeMap<String, BusRef>,
    /// Names of the buses the document declares.
    pub declared_buses: BTreeSet<String>,
    pub rules: BTreeMap<RuleKey, ResolvedRule>,
    pub targets: BTreeMap<TargetKey, ResolvedTarget>,
    /// Targets that asked for a Lambda invoke permission.
    pub lambda_permission_requests: BTreeSet<TargetKey>,
    pub archives: BTreeMap<String, ResolvedArchive>,
    pub permissions: BTreeMap<String, ResolvedPermission>,
    pub connections: BTreeMap<String, ResolvedConnection>,
    pub api_destinations: BTreeMap<String, ResolvedApiDestination>,
}

impl FlatModel {
    /// Rules attached to `bus`, in key order.
    pub fn rules_on<'a>(
        &'a self,
        bus: &'a str,
    ) -> impl Iterator<Item = (&'a RuleKey, &'a ResolvedRule)> + 'a {
        self.rules.iter().filter(move |(key, _)| key.bus() == bus)
    }

    /// Targets attached to `rule`, in key order.
    pub fn targets_of<'a>(
        &'a self,
        rule: &'a RuleKey,
    ) -> impl Iterator<Item = (&'a TargetKey, &'a ResolvedTarget)> + 'a {
        self.targets
            .iter()
            .filter(move |(key, _)| key.rule_key() == rule)
    }

    /// Targets attached to any rule of `bus`, in key order.
    pub fn targets_on<'a>(
        &'a self,
        bus: &'a str,
    ) -> impl Iterator<Item = (&'a TargetKey, &'a ResolvedTarget)> + 'a {
        self.targets.iter().filter(move |(key, _)| key.bus() == bus)
    }

    /// Look up a rule by its textual composite key.
    #[must_use]
    pub fn lookup_rule(&self, key: &str) -> Option<(RuleKey, &ResolvedRule)> {
        let key: RuleKey = key.parse().ok()?;
        let rule = self.rules.get(&key)?;
        Some((key, rule))
    }

    /// Look up a target by its textual composite key.
    #[must_use]
    pub fn lookup_target(&self, key: &str) -> Option<(TargetKey, &ResolvedTarget)> {
        let key: TargetKey = key.parse().ok()?;
        let target = self.targets.get(&key)?;
        Some((key, target))
    }

    /// Regroup the flat entries by bus and rule.
    ///
    /// Rules without targets appear with an empty target set; buses without
    /// rules do not appear.
    #[must_use]
    pub fn renest(&self) -> Renested {
        let mut nested = Renested::new();
        for key in self.rules.keys() {
            nested
                .entry(key.bus().to_owned())
                .or_default()
                .entry(key.rule().to_owned())
                .or_default();
        }
        for key in self.targets.keys() {
            nested
                .entry(key.bus().to_owned())
                .or_default()
                .entry(key.rule_key().rule().to_owned())
                .or_default()
                .insert(key.target().to_owned());
        }
        nested
    }
}

/// ARN of an event bus.
#[must_use]
pub fn bus_arn(config: &CompilerConfig, bus: &str) -> Arn {
    config.arn("events", format!("event-bus/{bus}"))
}

/// ARN of a rule. Rules on the default bus omit the bus segment.
#[must_use]
pub fn rule_arn(config: &CompilerConfig, key: &RuleKey) -> Arn {
    if key.is_default_bus() {
        config.arn("events", format!("rule/{}", key.rule()))
    } else {
        config.arn("events", format!("rule/{}/{}", key.bus(), key.rule()))
    }
}

fn default_bus(config: &CompilerConfig) -> BusRef {
    BusRef {
        name: DEFAULT_BUS.to_owned(),
        arn: bus_arn(config, DEFAULT_BUS),
        managed: false,
        prevent_destroy: false,
        description: None,
        tags: BTreeMap::new(),
    }
}

/// Flatten a validated specification.
#[must_use]
pub fn flatten(spec: &ValidatedSpec, config: &CompilerConfig) -> FlatModel {
    let mut flat = FlatModel::default();
    flat.buses
        .insert(DEFAULT_BUS.to_owned(), default_bus(config));

    for bus in &spec.buses {
        flat.declared_buses.insert(bus.name.clone());
        let managed = bus.name != DEFAULT_BUS;
        flat.buses.insert(
            bus.name.clone(),
            BusRef {
                name: bus.name.clone(),
                arn: bus_arn(config, &bus.name),
                managed,
                prevent_destroy: managed && bus.prevent_destroy,
                description: bus.description.clone(),
                tags: bus.tags.clone(),
            },
        );

        for rule in &bus.rules {
            let rule_key = RuleKey::new(&bus.name, &rule.name);
            let arn = rule_arn(config, &rule_key);

            for target in &rule.targets {
                let target_key = rule_key.target(&target.id);
                if target.attach_lambda_permission {
                    flat.lambda_permission_requests.insert(target_key.clone());
                }
                flat.targets.insert(
                    target_key,
                    ResolvedTarget {
                        id: target.id.clone(),
                        rule: rule_key.clone(),
                        arn: target.arn.clone(),
                        input: target.input.clone(),
                        dead_letter_arn: target.dead_letter_arn.clone(),
                        retry_policy: target.retry_policy,
                        role_arn: target.role_arn.clone(),
                    },
                );
            }

            flat.rules.insert(
                rule_key,
                ResolvedRule {
                    name: rule.name.clone(),
                    bus: bus.name.clone(),
                    arn,
                    state: rule.state,
                    trigger: rule.trigger.clone(),
                    description: rule.description.clone(),
                    role_arn: rule.role_arn.clone(),
                },
            );
        }
    }

    for (name, archive) in &spec.archives {
        flat.archives.insert(
            name.clone(),
            ResolvedArchive {
                name: name.clone(),
                arn: config.arn("events", format!("archive/{name}")),
                source_bus_arn: bus_arn(config, &archive.source_bus),
                description: archive.description.clone(),
                event_pattern: archive.event_pattern.clone(),
                retention_days: archive.retention_days,
            },
        );
    }

    for (key, permission) in &spec.permissions {
        flat.permissions.insert(
            key.clone(),
            ResolvedPermission {
                bus: permission.bus.clone(),
                statement_id: permission.statement_id.clone(),
                principal: permission.principal.clone(),
                action: permission.action.clone(),
                organization_id: permission.organization_id.clone(),
            },
        );
    }

    for (name, connection) in &spec.connections {
        flat.connections.insert(
            name.clone(),
            ResolvedConnection {
                name: name.clone(),
                arn: config.arn("events", format!("connection/{name}")),
                description: connection.description.clone(),
                auth: connection.auth.clone(),
            },
        );
    }

    for (name, destination) in &spec.api_destinations {
        flat.api_destinations.insert(
            name.clone(),
            ResolvedApiDestination {
                name: name.clone(),
                arn: config.arn("events", format!("api-destination/{name}")),
                connection_arn: config.arn(
                    "events",
                    format!("connection/{}", destination.connection),
                ),
                description: destination.description.clone(),
                invocation_endpoint: destination.invocation_endpoint.clone(),
                http_method: destination.http_method.clone(),
                invocation_rate_limit_per_second: destination.invocation_rate_limit_per_second,
            },
        );
    }

    debug!(
        buses = flat.buses.len(),
        rules = flat.rules.len(),
        targets = flat.targets.len(),
        "flattened routing specification"
    );
    flat
}

#[cfg(test)]
mod tests {
    use rustack_events_model::types::{RuleState, RuleTrigger, TargetInput};

    use super::*;
    use crate::model::{Bus, Rule, Target};

    fn target(id: &str) -> Target {
        Target {
            id: id.to_owned(),
            arn: "arn:aws:sqs:us-east-1:123456789012:orders".parse().unwrap(),
            input: TargetInput::Matched,
            dead_letter_arn: None,
            retry_policy: None,
            role_arn: None,
            attach_lambda_permission: false,
        }
    }

    fn rule(name: &str, targets: Vec<Target>) -> Rule {
        Rule {
            name: name.to_owned(),
            description: None,
            state: RuleState::Enabled,
            trigger: RuleTrigger::Pattern {
                pattern: serde_json::json!({"source": ["shop"]}),
            },
            role_arn: None,
            targets,
        }
    }

    fn bus(name: &str, rules: Vec<Rule>) -> Bus {
        Bus {
            name: name.to_owned(),
            description: None,
            tags: BTreeMap::new(),
            prevent_destroy: true,
            rules,
        }
    }

    fn spec(buses: Vec<Bus>) -> ValidatedSpec {
        ValidatedSpec {
            buses,
            ..ValidatedSpec::default()
        }
    }

    #[test]
    fn test_should_always_include_unmanaged_default_bus() {
        let flat = flatten(&spec(vec![]), &CompilerConfig::default());
        let default = &flat.buses[DEFAULT_BUS];
        assert!(!default.managed);
        assert_eq!(
            default.arn.to_string(),
            "arn:aws:events:us-east-1:000000000000:event-bus/default"
        );
        assert!(flat.declared_buses.is_empty());
    }

    #[test]
    fn test_should_address_entries_by_composite_key() {
        let flat = flatten(
            &spec(vec![
                bus("A", vec![rule("r1", vec![target("t1"), target("t2")])]),
                bus(DEFAULT_BUS, vec![rule("nightly", vec![target("t1")])]),
            ]),
            &CompilerConfig::default(),
        );

        assert_eq!(flat.rules.len(), 2);
        assert_eq!(flat.targets.len(), 3);
        assert!(flat.buses["A"].managed);
        assert!(flat.buses["A"].prevent_destroy);
        assert!(!flat.buses[DEFAULT_BUS].prevent_destroy);
        assert_eq!(
            flat.rules[&RuleKey::new("A", "r1")].arn.to_string(),
            "arn:aws:events:us-east-1:000000000000:rule/A/r1"
        );
        assert_eq!(
            flat.rules[&RuleKey::new(DEFAULT_BUS, "nightly")]
                .arn
                .to_string(),
            "arn:aws:events:us-east-1:000000000000:rule/nightly"
        );
        assert_eq!(
            flat.targets[&TargetKey::new("A", "r1", "t2")].rule,
            RuleKey::new("A", "r1")
        );
        assert_eq!(flat.targets_of(&RuleKey::new("A", "r1")).count(), 2);
        assert_eq!(flat.rules_on("A").count(), 1);
    }

    #[test]
    fn test_should_renest_without_loss_or_duplication() {
        let input = spec(vec![
            bus("A", vec![
                rule("r1", vec![target("t1"), target("t2")]),
                rule("r2", vec![]),
            ]),
            bus("B", vec![rule("r1", vec![target("t1")])]),
            bus("C", vec![]),
        ]);
        let flat = flatten(&input, &CompilerConfig::default());
        let nested = flat.renest();

        let mut expected = Renested::new();
        for bus in &input.buses {
            for rule in &bus.rules {
                let targets = expected
                    .entry(bus.name.clone())
                    .or_default()
                    .entry(rule.name.clone())
                    .or_default();
                targets.extend(rule.targets.iter().map(|t| t.id.clone()));
            }
        }
        assert_eq!(nested, expected);
    }

    #[test]
    fn test_should_not_depend_on_input_order() {
        let config = CompilerConfig::default();
        let forward = flatten(
            &spec(vec![
                bus("A", vec![rule("r1", vec![target("t1")]), rule("r2", vec![])]),
                bus("B", vec![]),
            ]),
            &config,
        );
        let reversed = flatten(
            &spec(vec![
                bus("B", vec![]),
                bus("A", vec![rule("r2", vec![]), rule("r1", vec![target("t1")])]),
            ]),
            &config,
        );
        assert_eq!(forward, reversed);
    }
}
