//! Projection of a resolved model into [`CompiledOutput`].
//!
//! Runs only once every stage has succeeded and performs no checks of its
//! own.

use rustack_events_model::output::{CompiledOutput, Dashboard, ObservabilitySummary};
use rustack_events_model::types::Origin;

use crate::flatten::FlatModel;
use crate::resolve::ResolvedAlarms;
use crate::synthesize::Synthesized;

/// Build the output maps.
#[must_use]
pub fn project(
    flat: FlatModel,
    synthesized: Synthesized,
    alarms: ResolvedAlarms,
    dashboard: Option<Dashboard>,
) -> CompiledOutput {
    let summary = summarize(&alarms, dashboard.as_ref());
    let rule_arns = flat
        .rules
        .iter()
        .map(|(key, rule)| (key.clone(), rule.arn.clone()))
        .collect();
    let target_arns = flat
        .targets
        .iter()
        .map(|(key, target)| (key.clone(), target.arn.clone()))
        .collect();

    CompiledOutput {
        buses: flat.buses,
        rules: flat.rules,
        rule_arns,
        targets: flat.targets,
        target_arns,
        alarms: alarms.alarms,
        anomaly_alarms: alarms.anomaly_alarms,
        dead_letter_alarms: alarms.dead_letter_alarms,
        log_routes: synthesized.log_routes,
        lambda_permissions: synthesized.lambda_permissions,
        archives: flat.archives,
        permissions: flat.permissions,
        connections: flat.connections,
        api_destinations: flat.api_destinations,
        dashboard,
        summary,
    }
}

fn summarize(alarms: &ResolvedAlarms, dashboard: Option<&Dashboard>) -> ObservabilitySummary {
    let mut summary = ObservabilitySummary {
        dashboard_enabled: dashboard.is_some(),
        dashboard_name: dashboard.map(|d| d.name.clone()),
        ..ObservabilitySummary::default()
    };
    for origin in alarms.origins() {
        summary.total_alarms += 1;
        match origin {
            Origin::Synthesized => summary.synthesized_alarms += 1,
            Origin::User => summary.user_alarms += 1,
            Origin::Overridden => summary.overridden_alarms += 1,
        }
    }
    summary
}
