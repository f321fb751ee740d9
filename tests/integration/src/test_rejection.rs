//! Rejected specifications and the diagnostics they produce.

#[cfg(test)]
mod tests {
    use rustack_events_core::CompileError;
    use rustack_events_model::DiagnosticCategory;
    use rustack_events_model::alarm::DeadLetterAlarmSpec;

    use crate::{compile_rejected, compiler, load_spec, parse_spec};

    #[test]
    fn test_should_report_every_validation_problem_at_once() {
        let spec = parse_spec(
            r#"{
                "buses": [
                    {
                        "name": "orders",
                        "rules": [
                            {
                                "name": "both",
                                "event_pattern": "{\"source\": [\"shop\"]}",
                                "schedule_expression": "rate(5 minutes)",
                                "targets": []
                            },
                            {
                                "name": "neither",
                                "targets": [{"id": "t", "arn": "not-an-arn"}]
                            },
                            {
                                "name": "bad:name",
                                "event_pattern": "[1, 2]",
                                "targets": []
                            }
                        ]
                    },
                    {"name": "orders"}
                ]
            }"#,
        );

        let diagnostics = compile_rejected(&spec);
        let paths: Vec<&str> = diagnostics.iter().map(|d| d.path.as_str()).collect();
        assert!(paths.contains(&"buses[0].rules[0]"), "{paths:?}");
        assert!(paths.contains(&"buses[0].rules[1]"), "{paths:?}");
        assert!(paths.contains(&"buses[0].rules[1].targets[0].arn"), "{paths:?}");
        assert!(paths.contains(&"buses[0].rules[2].name"), "{paths:?}");
        assert!(paths.contains(&"buses[0].rules[2].event_pattern"), "{paths:?}");
        assert!(paths.contains(&"buses[1].name"), "{paths:?}");
        assert!(diagnostics.count(DiagnosticCategory::Structural) >= 3);
        assert!(diagnostics.count(DiagnosticCategory::Semantic) >= 2);
    }

    #[test]
    fn test_should_reject_schedule_on_custom_bus() {
        let spec = parse_spec(
            r#"{
                "buses": [{
                    "name": "orders",
                    "rules": [{"name": "tick", "schedule_expression": "rate(1 hour)"}]
                }]
            }"#,
        );
        let diagnostics = compile_rejected(&spec);
        assert_eq!(diagnostics.len(), 1);
        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(diagnostic.category, DiagnosticCategory::Semantic);
        assert!(diagnostic.path.starts_with("buses[0].rules[0]"));
    }

    #[test]
    fn test_should_name_alarm_key_when_queue_name_is_unresolvable() {
        let mut spec = load_spec("two_buses");
        spec.dead_letter_alarms.insert(
            "orphan-queue".to_owned(),
            DeadLetterAlarmSpec {
                threshold: 1.0,
                ..DeadLetterAlarmSpec::default()
            },
        );
        let diagnostics = compile_rejected(&spec);
        assert_eq!(diagnostics.len(), 1);
        let diagnostic = diagnostics.iter().next().unwrap();
        assert_eq!(diagnostic.category, DiagnosticCategory::Resolution);
        assert_eq!(diagnostic.path, "dead_letter_alarms.orphan-queue");
        assert!(diagnostic.message.contains("orphan-queue"));
    }

    #[test]
    fn test_should_fail_closed_on_non_queue_identifier() {
        let mut spec = load_spec("two_buses");
        spec.dead_letter_alarms.insert(
            "topic".to_owned(),
            DeadLetterAlarmSpec {
                target_key: Some("A:r1:t1".to_owned()),
                queue_arn: Some("arn:aws:sns:us-east-1:123456789012:alerts".to_owned()),
                ..DeadLetterAlarmSpec::default()
            },
        );
        let diagnostics = compile_rejected(&spec);
        assert_eq!(diagnostics.count(DiagnosticCategory::Resolution), 1);
        assert!(
            diagnostics
                .iter()
                .any(|d| d.message.contains("not an SQS queue ARN"))
        );
    }

    #[test]
    fn test_should_reject_broken_sibling_references() {
        let spec = parse_spec(
            r#"{
                "buses": [{
                    "name": "orders",
                    "rules": [{
                        "name": "forward",
                        "event_pattern": "{\"source\": [\"shop\"]}",
                        "targets": [{
                            "id": "bus",
                            "arn": "arn:aws:events:us-east-1:123456789012:event-bus/missing"
                        }]
                    }]
                }],
                "archives": {"orders-archive": {"source_bus": "audit"}},
                "permissions": {"partner": {"bus": "audit", "principal": "210987654321", "statement_id": "partner"}},
                "api_destinations": {"crm": {"connection": "crm-auth", "invocation_endpoint": "https://crm.example.com"}}
            }"#,
        );
        let diagnostics = compile_rejected(&spec);
        assert_eq!(diagnostics.count(DiagnosticCategory::Referential), 4);
        let paths: Vec<&str> = diagnostics.iter().map(|d| d.path.as_str()).collect();
        assert_eq!(paths, vec![
            "targets.orders:forward:bus.arn",
            "archives.orders-archive.source_bus",
            "permissions.partner.bus",
            "api_destinations.crm.connection",
        ]);
    }

    #[test]
    fn test_should_surface_diagnostics_through_compile_error() -> anyhow::Result<()> {
        let mut spec = load_spec("two_buses");
        spec.observability.period = 45;
        let err = compiler()
            .compile(&spec)
            .into_result()
            .expect_err("period 45 is invalid");
        assert!(matches!(err, CompileError::Rejected { .. }));
        let diagnostics = err.diagnostics().expect("diagnostics");
        assert_eq!(diagnostics.iter().next().unwrap().path, "observability.period");

        let json = serde_json::to_value(diagnostics)?;
        assert_eq!(json[0]["category"], "semantic");
        assert_eq!(json[0]["path"], "observability.period");
        Ok(())
    }
}
