//! A specification exercising every collection and input variant.

#[cfg(test)]
mod tests {
    use rustack_events_model::keys::{RuleKey, TargetKey};
    use rustack_events_model::types::{ConnectionAuth, Origin, RuleState, RuleTrigger, TargetInput};

    use crate::{compile_ok, load_spec, parse_spec};

    #[test]
    fn test_should_flatten_buses_rules_and_targets() -> anyhow::Result<()> {
        let output = compile_ok(&load_spec("full"));

        assert_eq!(output.buses.keys().collect::<Vec<_>>(), vec!["default", "orders"]);
        assert!(output.buses["orders"].managed);
        assert!(output.buses["orders"].prevent_destroy);
        assert!(!output.buses["default"].managed);

        let created: RuleKey = "orders:created".parse()?;
        let nightly: RuleKey = "default:nightly".parse()?;
        assert_eq!(
            output.rule_arns[&created].to_string(),
            "arn:aws:events:us-east-1:123456789012:rule/orders/created"
        );
        assert_eq!(
            output.rule_arns[&nightly].to_string(),
            "arn:aws:events:us-east-1:123456789012:rule/nightly"
        );
        assert_eq!(
            output.rules[&"orders:cancelled".parse::<RuleKey>()?].state,
            RuleState::Disabled
        );
        assert_eq!(
            output.rules[&nightly].trigger.schedule().map(ToString::to_string),
            Some("cron(0 2 * * ? *)".to_owned())
        );
        assert!(matches!(output.rules[&created].trigger, RuleTrigger::Pattern { .. }));

        assert_eq!(output.targets.len(), 5);
        assert_eq!(output.target_arns.len(), 5);
        let audit: TargetKey = "orders:created:audit".parse()?;
        assert!(matches!(
            output.targets[&audit].input,
            TargetInput::Transform { .. }
        ));
        let fulfil = &output.targets[&"orders:created:fulfil".parse::<TargetKey>()?];
        let retry = fulfil.retry_policy.expect("retry policy");
        assert_eq!(retry.maximum_retry_attempts, 3);
        assert_eq!(retry.maximum_event_age_in_seconds, 86_400);
        Ok(())
    }

    #[test]
    fn test_should_merge_user_alarms_over_defaults() {
        let output = compile_ok(&load_spec("full"));

        let keys: Vec<&str> = output.alarms.keys().map(String::as_str).collect();
        assert_eq!(keys, vec![
            "failed_invocations_orders:cancelled",
            "failed_invocations_orders:created",
            "throttled_rules_default",
            "throttled_rules_orders",
        ]);
        // disabled override suppresses the default without projecting anything
        assert!(!output.alarms.contains_key("failed_invocations_default:nightly"));

        let created = &output.alarms["failed_invocations_orders:created"];
        assert_eq!(created.origin, Origin::Overridden);
        assert_eq!(created.evaluation_periods, 3);
        assert_eq!(created.alarm_actions, vec!["arn:aws:sns:us-east-1:123456789012:oncall"]);

        let cancelled = &output.alarms["failed_invocations_orders:cancelled"];
        assert_eq!(cancelled.alarm_actions, vec!["arn:aws:sns:us-east-1:123456789012:ops"]);
        assert_eq!(
            cancelled.arn.to_string(),
            "arn:aws:cloudwatch:us-east-1:123456789012:alarm:failed_invocations_orders:cancelled"
        );

        assert!(output.alarms["throttled_rules_default"].dimensions.is_empty());
        assert_eq!(
            output.alarms["throttled_rules_orders"].dimensions["EventBusName"],
            "orders"
        );

        let anomaly = &output.anomaly_alarms["orders-traffic"];
        assert_eq!(anomaly.origin, Origin::User);
        assert_eq!(anomaly.dimensions["RuleName"], "created");
        assert_eq!(anomaly.bus, "orders");

        assert_eq!(
            output.dead_letter_alarms["dead_letter_orders:created:audit"].dimensions["QueueName"],
            "audit-dlq"
        );
        let payments = &output.dead_letter_alarms["payments-dlq"];
        assert_eq!(payments.dimensions["QueueName"], "payments-dlq");
        assert_eq!(payments.bus, "default");

        assert_eq!(output.summary.total_alarms, 7);
        assert_eq!(output.summary.synthesized_alarms, 4);
        assert_eq!(output.summary.user_alarms, 2);
        assert_eq!(output.summary.overridden_alarms, 1);
    }

    #[test]
    fn test_should_synthesize_log_routes_and_permissions() {
        let output = compile_ok(&load_spec("full"));

        assert_eq!(
            output.log_routes.keys().collect::<Vec<_>>(),
            vec!["catch_all_default", "catch_all_orders"]
        );
        let route = &output.log_routes["catch_all_orders"];
        assert_eq!(route.log_group_name, "/aws/events/orders");
        assert_eq!(route.retention_days, 30);
        assert_eq!(route.event_pattern["account"][0], "123456789012");

        let permission = &output.lambda_permissions[&"orders:created:fulfil"
            .parse::<TargetKey>()
            .unwrap()];
        assert_eq!(permission.principal, "events.amazonaws.com");
        assert_eq!(permission.action, "lambda:InvokeFunction");
        assert_eq!(
            permission.source_arn.to_string(),
            "arn:aws:events:us-east-1:123456789012:rule/orders/created"
        );
        assert_eq!(output.lambda_permissions.len(), 1);
    }

    #[test]
    fn test_should_resolve_sibling_collections() {
        let output = compile_ok(&load_spec("full"));

        let archive = &output.archives["orders-archive"];
        assert_eq!(
            archive.source_bus_arn.to_string(),
            "arn:aws:events:us-east-1:123456789012:event-bus/orders"
        );
        assert_eq!(archive.retention_days, 90);

        assert_eq!(output.permissions["partner"].principal, "210987654321");
        assert!(matches!(
            output.connections["crm-auth"].auth,
            ConnectionAuth::ApiKey { .. }
        ));
        let destination = &output.api_destinations["crm"];
        assert_eq!(
            destination.connection_arn.to_string(),
            "arn:aws:events:us-east-1:123456789012:connection/crm-auth"
        );
        assert_eq!(destination.http_method, "POST");
        assert_eq!(destination.invocation_rate_limit_per_second, 20);

        let dashboard = output.dashboard.as_ref().expect("dashboard");
        assert_eq!(dashboard.name, "eventbridge-default-orders");
        assert_eq!(
            dashboard.body()["widgets"].as_array().map(Vec::len),
            Some(dashboard.widgets.len())
        );
    }

    #[test]
    fn test_should_issue_distinct_statement_ids_on_one_function() -> anyhow::Result<()> {
        let spec = parse_spec(
            r#"{
                "buses": [{
                    "name": "A",
                    "rules": [
                        {
                            "name": "a.b",
                            "event_pattern": "{\"source\": [\"shop\"]}",
                            "targets": [{
                                "id": "fn",
                                "arn": "arn:aws:lambda:us-east-1:123456789012:function:audit",
                                "attach_lambda_permission": true
                            }]
                        },
                        {
                            "name": "a-b",
                            "event_pattern": "{\"source\": [\"shop\"]}",
                            "targets": [{
                                "id": "fn",
                                "arn": "arn:aws:lambda:us-east-1:123456789012:function:audit",
                                "attach_lambda_permission": true
                            }]
                        }
                    ]
                }]
            }"#,
        );
        let output = compile_ok(&spec);

        let dotted = &output.lambda_permissions[&"A:a.b:fn".parse::<TargetKey>()?];
        let dashed = &output.lambda_permissions[&"A:a-b:fn".parse::<TargetKey>()?];
        assert_eq!(dotted.function_arn, dashed.function_arn);
        assert_ne!(dotted.statement_id, dashed.statement_id);
        Ok(())
    }
}
