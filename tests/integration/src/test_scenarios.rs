//! The reference scenarios: two buses with observability on, a user override
//! of a synthesized alarm, and a dangling rule reference.

#[cfg(test)]
mod tests {
    use rustack_events_model::alarm::{AlarmSpec, ComparisonOperator};
    use rustack_events_model::output::WidgetBody;
    use rustack_events_model::types::Origin;
    use rustack_events_model::DiagnosticCategory;

    use crate::{compile_ok, compile_rejected, load_spec};

    #[test]
    fn test_should_synthesize_defaults_for_two_buses() {
        let output = compile_ok(&load_spec("two_buses"));

        let failed: Vec<&String> = output
            .alarms
            .keys()
            .filter(|key| key.starts_with("failed_invocations_"))
            .collect();
        assert_eq!(failed, vec!["failed_invocations_A:r1"]);
        let alarm = &output.alarms["failed_invocations_A:r1"];
        assert_eq!(alarm.origin, Origin::Synthesized);
        assert_eq!(alarm.dimensions["RuleName"], "r1");
        assert_eq!(alarm.dimensions["EventBusName"], "A");

        assert_eq!(output.dead_letter_alarms.len(), 1);
        let dlq = &output.dead_letter_alarms["dead_letter_A:r1:t1"];
        assert_eq!(dlq.dimensions["QueueName"], "orders-dlq");
        assert_eq!(dlq.namespace, "AWS/SQS");

        let dashboard = output.dashboard.as_ref().expect("dashboard");
        assert_eq!(dashboard.name, "eventbridge-A-B");
        let groups: Vec<&str> = dashboard
            .widgets
            .iter()
            .filter_map(|w| match &w.body {
                WidgetBody::Text(text) => Some(text.markdown.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(groups.len(), 2);
        assert!(groups[0].contains("`A`"));
        assert!(groups[1].contains("`B`"));

        assert_eq!(output.summary.dashboard_name.as_deref(), Some("eventbridge-A-B"));
        assert_eq!(output.summary.total_alarms, 3);
        assert_eq!(output.summary.synthesized_alarms, 3);
        assert_eq!(output.summary.user_alarms, 0);
    }

    #[test]
    fn test_should_let_user_alarm_replace_synthesized_default() {
        let mut spec = load_spec("two_buses");
        let mut user = AlarmSpec::new(
            "FailedInvocations",
            ComparisonOperator::GreaterThanOrEqualToThreshold,
            25.0,
        );
        user.rule_key = Some("A:r1".to_owned());
        spec.alarms.insert("failed_invocations_A:r1".to_owned(), user);

        let output = compile_ok(&spec);
        let merged: Vec<_> = output
            .alarms
            .iter()
            .filter(|(key, _)| key.as_str() == "failed_invocations_A:r1")
            .collect();
        assert_eq!(merged.len(), 1);
        let alarm = merged[0].1;
        assert!((alarm.threshold - 25.0).abs() < f64::EPSILON);
        assert_eq!(alarm.origin, Origin::Overridden);
        // the synthesized notBreaching does not leak into the user object
        assert_eq!(
            alarm.treat_missing_data,
            rustack_events_model::alarm::TreatMissingData::Missing
        );
        assert_eq!(output.summary.overridden_alarms, 1);
        assert_eq!(output.summary.total_alarms, 3);
    }

    #[test]
    fn test_should_reject_dangling_rule_reference_once() {
        let mut spec = load_spec("two_buses");
        let mut broken = AlarmSpec::new(
            "FailedInvocations",
            ComparisonOperator::GreaterThanThreshold,
            0.0,
        );
        broken.rule_key = Some("A:missing_rule".to_owned());
        spec.alarms.insert("broken".to_owned(), broken);

        let diagnostics = compile_rejected(&spec);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.count(DiagnosticCategory::Referential), 1);
        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(diagnostic.path, "alarms.broken.rule_key");
        assert!(diagnostic.message.contains("A:missing_rule"));
    }
}
