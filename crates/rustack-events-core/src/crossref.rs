//! Cross-reference checks between independently keyed collections.
//!
//! Runs after merging, since a user alarm may introduce a reference no
//! default had. Only reads the model; every broken reference becomes one
//! diagnostic naming the referencing key and the missing entity.

use rustack_core::Arn;
use rustack_events_model::Diagnostics;
use rustack_events_model::keys::RuleKey;
use tracing::debug;

use crate::config::CompilerConfig;
use crate::flatten::FlatModel;
use crate::merge::MergedAlarms;
use crate::model::ValidatedSpec;
use crate::synthesize::{CATCH_ALL_RULE, Synthesized};

/// Check every reference of the merged model.
#[must_use]
pub fn check(
    spec: &ValidatedSpec,
    flat: &FlatModel,
    alarms: &MergedAlarms,
    synthesized: &Synthesized,
    config: &CompilerConfig,
) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    for (key, alarm) in &alarms.alarms {
        if alarm.value.enabled {
            check_rule_ref(
                flat,
                &format!("alarms.{key}.rule_key"),
                alarm.value.rule_key.as_deref(),
                &mut diagnostics,
            );
        }
    }
    for (key, alarm) in &alarms.anomaly_alarms {
        if alarm.value.enabled {
            check_rule_ref(
                flat,
                &format!("anomaly_alarms.{key}.rule_key"),
                alarm.value.rule_key.as_deref(),
                &mut diagnostics,
            );
        }
    }
    for (key, alarm) in &alarms.dead_letter_alarms {
        if !alarm.value.enabled {
            continue;
        }
        if let Some(target) = alarm.value.target_key.as_deref() {
            if flat.lookup_target(target).is_none() {
                diagnostics.referential(
                    format!("dead_letter_alarms.{key}.target_key"),
                    format!("target '{target}' does not exist"),
                );
            }
        }
    }

    for (key, target) in &flat.targets {
        check_target_destination(
            flat,
            config,
            &target.arn,
            &format!("targets.{key}.arn"),
            &mut diagnostics,
        );
    }

    for (name, archive) in &spec.archives {
        if !flat.buses.contains_key(&archive.source_bus) {
            diagnostics.referential(
                format!("archives.{name}.source_bus"),
                format!("bus '{}' does not exist", archive.source_bus),
            );
        }
    }
    for (key, permission) in &spec.permissions {
        if !flat.buses.contains_key(&permission.bus) {
            diagnostics.referential(
                format!("permissions.{key}.bus"),
                format!("bus '{}' does not exist", permission.bus),
            );
        }
    }
    for (name, destination) in &spec.api_destinations {
        if !flat.connections.contains_key(&destination.connection) {
            diagnostics.referential(
                format!("api_destinations.{name}.connection"),
                format!("connection '{}' does not exist", destination.connection),
            );
        }
    }

    for (key, route) in &synthesized.log_routes {
        let rule = RuleKey::new(&route.bus, CATCH_ALL_RULE);
        if flat.rules.contains_key(&rule) {
            diagnostics.structural(
                format!("log_routes.{key}"),
                format!("synthesized catch-all rule collides with rule '{rule}'"),
            );
        }
    }

    debug!(diagnostics = diagnostics.len(), "checked cross-references");
    diagnostics
}

fn check_rule_ref(
    flat: &FlatModel,
    path: &str,
    rule: Option<&str>,
    diagnostics: &mut Diagnostics,
) {
    if let Some(rule) = rule {
        if flat.lookup_rule(rule).is_none() {
            diagnostics.referential(path, format!("rule '{rule}' does not exist"));
        }
    }
}

/// Destinations inside the compiling account and region must be declared
/// in this document; foreign ones are taken as given.
fn check_target_destination(
    flat: &FlatModel,
    config: &CompilerConfig,
    arn: &Arn,
    path: &str,
    diagnostics: &mut Diagnostics,
) {
    if arn.service() != "events" || !config.owns(arn) {
        return;
    }
    match arn.resource_type() {
        Some("event-bus") => {
            let bus = arn.resource_id();
            if !flat.buses.contains_key(bus) {
                diagnostics.referential(path, format!("event bus '{bus}' is not declared"));
            }
        }
        Some("api-destination") => {
            let name = arn
                .resource_id()
                .split('/')
                .next()
                .unwrap_or_default();
            if !flat.api_destinations.contains_key(name) {
                diagnostics.referential(
                    path,
                    format!("API destination '{name}' is not declared"),
                );
            }
        }
        _ => {}
    }
}
