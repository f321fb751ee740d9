//! Dashboard derived from the resolved model.
//!
//! Every declared bus gets one widget group: a header, rule traffic and
//! throttling graphs when the bus carries rules, a dead-letter queue depth
//! graph when one of its targets has a dead-letter alarm, and an alarm status
//! panel when any alarm watches the bus. Groups are stacked top to bottom in
//! bus name order.

use rustack_core::Arn;
use rustack_events_model::alarm::{DEAD_LETTER_METRIC, EVENTS_NAMESPACE, SQS_NAMESPACE, Statistic};
use rustack_events_model::keys::RuleKey;
use rustack_events_model::output::{
    AlarmWidget, Dashboard, MetricWidget, TextWidget, Widget, WidgetBody,
};
use rustack_events_model::ObservabilityToggles;
use tracing::debug;

use crate::config::CompilerConfig;
use crate::flatten::FlatModel;
use crate::naming;
use crate::resolve::{EVENT_BUS_NAME_DIMENSION, QUEUE_NAME_DIMENSION, RULE_NAME_DIMENSION, ResolvedAlarms};
use crate::synthesize::THROTTLED_RULES_METRIC;

/// CloudWatch limit on dashboard names.
pub const MAX_DASHBOARD_NAME_LEN: usize = 255;

/// Width of the dashboard grid.
const GRID_WIDTH: u32 = 24;
const HEADER_HEIGHT: u32 = 1;
const PANEL_WIDTH: u32 = 12;
const PANEL_HEIGHT: u32 = 6;

/// Per-rule metrics graphed in the traffic widget.
const RULE_METRICS: [&str; 3] = ["Invocations", "FailedInvocations", "TriggeredRules"];

/// Name of the dashboard covering `buses`.
///
/// The bus names are sorted, so the name does not depend on declaration
/// order.
///
/// # Examples
///
/// ```
/// use rustack_events_core::dashboard::dashboard_name;
///
/// assert_eq!(dashboard_name("eventbridge", ["orders", "audit"]), "eventbridge-audit-orders");
/// assert_eq!(dashboard_name("eventbridge", ["team/orders"]), "eventbridge-team-orders");
/// ```
#[must_use]
pub fn dashboard_name<'a>(prefix: &str, buses: impl IntoIterator<Item = &'a str>) -> String {
    let mut buses: Vec<&str> = buses.into_iter().collect();
    buses.sort_unstable();
    let natural = std::iter::once(prefix)
        .chain(buses)
        .collect::<Vec<_>>()
        .join("-");
    naming::sanitized(&natural, MAX_DASHBOARD_NAME_LEN)
}

/// Generate the dashboard, if the toggles ask for one and any bus is
/// declared.
#[must_use]
pub fn generate(
    flat: &FlatModel,
    alarms: &ResolvedAlarms,
    toggles: &ObservabilityToggles,
    config: &CompilerConfig,
) -> Option<Dashboard> {
    if !toggles.synthesizes(toggles.dashboard) || flat.declared_buses.is_empty() {
        return None;
    }

    let mut layout = Layout::default();
    for bus in &flat.declared_buses {
        bus_group(&mut layout, bus, flat, alarms, toggles.period, config);
    }

    let name = dashboard_name(
        &config.dashboard_prefix,
        flat.declared_buses.iter().map(String::as_str),
    );
    debug!(dashboard = %name, widgets = layout.widgets.len(), "generated dashboard");
    Some(Dashboard {
        name,
        widgets: layout.widgets,
    })
}

fn bus_group(
    layout: &mut Layout,
    bus: &str,
    flat: &FlatModel,
    alarms: &ResolvedAlarms,
    period: u32,
    config: &CompilerConfig,
) {
    let rules: Vec<&RuleKey> = flat.rules_on(bus).map(|(key, _)| key).collect();
    let managed = flat.buses.get(bus).is_some_and(|b| b.managed);

    layout.header(format!(
        "# Event bus `{bus}`\n{} rule(s), {} target(s)",
        rules.len(),
        flat.targets_on(bus).count()
    ));

    if !rules.is_empty() {
        let metrics = rules
            .iter()
            .flat_map(|rule| {
                RULE_METRICS.iter().map(move |metric| {
                    let mut row = vec![
                        EVENTS_NAMESPACE.to_owned(),
                        (*metric).to_owned(),
                        RULE_NAME_DIMENSION.to_owned(),
                        rule.rule().to_owned(),
                    ];
                    if !rule.is_default_bus() {
                        row.extend([EVENT_BUS_NAME_DIMENSION.to_owned(), bus.to_owned()]);
                    }
                    row
                })
            })
            .collect();
        layout.panel(metric_widget(
            format!("{bus} rule traffic"),
            metrics,
            Statistic::Sum,
            period,
            config,
        ));

        let mut throttled = vec![EVENTS_NAMESPACE.to_owned(), THROTTLED_RULES_METRIC.to_owned()];
        if managed {
            throttled.extend([EVENT_BUS_NAME_DIMENSION.to_owned(), bus.to_owned()]);
        }
        layout.panel(metric_widget(
            format!("{bus} throttled rules"),
            vec![throttled],
            Statistic::Sum,
            period,
            config,
        ));
    }

    let queues: Vec<Vec<String>> = alarms
        .dead_letter_alarms
        .values()
        .filter(|alarm| alarm.bus == bus)
        .filter_map(|alarm| alarm.dimensions.get(QUEUE_NAME_DIMENSION))
        .map(|queue| {
            vec![
                SQS_NAMESPACE.to_owned(),
                DEAD_LETTER_METRIC.to_owned(),
                QUEUE_NAME_DIMENSION.to_owned(),
                queue.clone(),
            ]
        })
        .collect();
    if !queues.is_empty() {
        layout.panel(metric_widget(
            format!("{bus} dead-letter queue depth"),
            queues,
            Statistic::Maximum,
            period,
            config,
        ));
    }

    let mut arns: Vec<Arn> = alarms
        .alarms
        .values()
        .chain(alarms.dead_letter_alarms.values())
        .filter(|alarm| alarm.bus == bus)
        .map(|alarm| alarm.arn.clone())
        .chain(
            alarms
                .anomaly_alarms
                .values()
                .filter(|alarm| alarm.bus == bus)
                .map(|alarm| alarm.arn.clone()),
        )
        .collect();
    if !arns.is_empty() {
        arns.sort_by_key(ToString::to_string);
        layout.panel(WidgetBody::Alarm(AlarmWidget {
            title: format!("{bus} alarms"),
            alarms: arns,
        }));
    }

    layout.end_group();
}

fn metric_widget(
    title: String,
    metrics: Vec<Vec<String>>,
    stat: Statistic,
    period: u32,
    config: &CompilerConfig,
) -> WidgetBody {
    WidgetBody::Metric(MetricWidget {
        title,
        region: config.region.as_str().to_owned(),
        metrics,
        stat,
        period,
        view: "timeSeries".to_owned(),
        stacked: false,
    })
}

/// Places widgets on the grid: full-width headers, then panels two per row.
#[derive(Debug, Default)]
struct Layout {
    widgets: Vec<Widget>,
    /// Top of the row being filled.
    y: u32,
    /// Left edge of the next panel, or `None` at the start of a row.
    x: Option<u32>,
}

impl Layout {
    fn header(&mut self, markdown: String) {
        self.widgets.push(Widget {
            x: 0,
            y: self.y,
            width: GRID_WIDTH,
            height: HEADER_HEIGHT,
            body: WidgetBody::Text(TextWidget { markdown }),
        });
        self.y += HEADER_HEIGHT;
    }

    fn panel(&mut self, body: WidgetBody) {
        let x = self.x.unwrap_or(0);
        self.widgets.push(Widget {
            x,
            y: self.y,
            width: PANEL_WIDTH,
            height: PANEL_HEIGHT,
            body,
        });
        if x + PANEL_WIDTH >= GRID_WIDTH {
            self.y += PANEL_HEIGHT;
            self.x = None;
        } else {
            self.x = Some(x + PANEL_WIDTH);
        }
    }

    fn end_group(&mut self) {
        if self.x.take().is_some() {
            self.y += PANEL_HEIGHT;
        }
    }
}
