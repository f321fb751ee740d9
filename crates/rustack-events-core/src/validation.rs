//! Validation for routing specifications.
//!
//! The `validate_*` and `parse_*` functions check one value each and return
//! the first rule it breaks, in the style of the AWS naming rules they
//! encode. [`validate`] walks the whole document, runs every check, and
//! collects each violation as a diagnostic instead of stopping at the first,
//! so one pass reports every defect.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::Regex;
use rustack_core::{AccountId, Arn};
use rustack_events_model::alarm::{
    AlarmActions, AlarmSpec, AnomalyAlarmSpec, DeadLetterAlarmSpec, Evaluation,
};
use rustack_events_model::keys::{DEFAULT_BUS, KEY_SEPARATOR, RuleKey, TargetKey};
use rustack_events_model::spec::{
    ApiDestinationSpec, ArchiveSpec, BusSpec, ConnectionSpec, InputTransformerSpec,
    PermissionSpec, RetryPolicySpec, RuleSpec, TargetSpec,
};
use rustack_events_model::types::{
    AuthorizationType, ConnectionAuth, RetryPolicy, RuleTrigger, ScheduleError,
    ScheduleExpression, TargetInput,
};
use rustack_events_model::{
    Diagnostic, DiagnosticCategory, Diagnostics, EventRoutingSpec, ObservabilityToggles,
};
use tracing::debug;

use crate::model::{
    ApiDestination, Archive, Bus, Connection, Permission, Rule, Target, ValidatedSpec,
};

/// Maximum event bus name length.
const MAX_BUS_NAME_LEN: usize = 256;

/// Maximum rule name, target id, and connection name length.
const MAX_NAME_LEN: usize = 64;

/// Maximum archive name length.
const MAX_ARCHIVE_NAME_LEN: usize = 48;

/// Maximum number of targets on one rule.
const MAX_TARGETS_PER_RULE: usize = 5;

/// Maximum number of tags on one bus.
const MAX_TAGS: usize = 50;

/// Maximum length of a tag key in characters.
const MAX_TAG_KEY_LEN: usize = 128;

/// Maximum length of a tag value in characters.
const MAX_TAG_VALUE_LEN: usize = 256;

/// Maximum description length.
const MAX_DESCRIPTION_LEN: usize = 512;

/// Maximum archive retention in days.
const MAX_ARCHIVE_RETENTION_DAYS: u32 = 36_500;

/// Maximum policy statement id length.
const MAX_STATEMENT_ID_LEN: usize = 64;

/// Maximum CloudWatch alarm name length.
pub const MAX_ALARM_NAME_LEN: usize = 255;

/// Maximum number of dimensions on one alarm.
const MAX_DIMENSIONS: usize = 30;

/// Maximum number of input paths on one transformer.
const MAX_INPUT_PATHS: usize = 100;

/// Maximum SQS queue name length.
const MAX_QUEUE_NAME_LEN: usize = 80;

/// Longest window an alarm may evaluate (`evaluation_periods * period`).
const MAX_EVALUATION_SECONDS: u64 = 604_800;

/// Largest accepted API destination invocation rate.
const MAX_INVOCATION_RATE: u32 = 300;

/// Largest accepted anomaly band width, in standard deviations.
const MAX_BAND_WIDTH: f64 = 10.0;

/// Retention values accepted by CloudWatch Logs.
pub const LOG_RETENTION_DAYS: [u32; 22] = [
    1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1096, 1827, 2192, 2557, 2922,
    3288, 3653,
];

/// Template variables EventBridge defines without an input path.
const PREDEFINED_TEMPLATE_VARIABLES: [&str; 5] = [
    "aws.events.event",
    "aws.events.event.json",
    "aws.events.event.ingestion-time",
    "aws.events.rule-arn",
    "aws.events.rule-name",
];

/// HTTP methods accepted by API destinations.
const API_DESTINATION_METHODS: [&str; 7] =
    ["POST", "GET", "HEAD", "OPTIONS", "PUT", "PATCH", "DELETE"];

/// HTTP methods accepted by OAuth token endpoints.
const OAUTH_METHODS: [&str; 3] = ["GET", "POST", "PUT"];

/// The only action a bus policy statement may grant.
const PUT_EVENTS_ACTION: &str = "events:PutEvents";

static BUS_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[/\.\-_A-Za-z0-9]+$").expect("valid regex"));

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\.\-_A-Za-z0-9]+$").expect("valid regex"));

static STATEMENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-_]+$").expect("valid regex"));

static ORGANIZATION_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^o-[a-z0-9]{10,32}$").expect("valid regex"));

static QUEUE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-_]+(\.fifo)?$").expect("valid regex"));

static TEMPLATE_VARIABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([A-Za-z0-9_.\-]+)>").expect("valid regex"));

/// A single violated rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("must not be empty")]
    Empty,

    #[error("must be at most {max} characters long, found {actual}")]
    TooLong { max: usize, actual: usize },

    #[error("must not contain the key separator ':'")]
    ContainsSeparator,

    #[error("may only contain {allowed}")]
    InvalidCharacters { allowed: &'static str },

    #[error("duplicate name '{0}'")]
    Duplicate(String),

    #[error("is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("must be a non-empty JSON object")]
    NotAnObject,

    #[error("{0}")]
    InvalidArn(String),

    #[error("{0}")]
    InvalidKey(String),

    #[error("invalid schedule expression: {0}")]
    InvalidSchedule(#[from] ScheduleError),

    #[error("template references undefined variable <{0}>")]
    UndefinedVariable(String),

    #[error("must be {expected}, found '{found}'")]
    WrongResource {
        expected: &'static str,
        found: String,
    },

    #[error("{fields} are mutually exclusive")]
    MutuallyExclusive { fields: &'static str },

    #[error("exactly one of {fields} is required")]
    MissingOneOf { fields: &'static str },

    #[error("must be {range}, found {found}")]
    OutOfRange { range: &'static str, found: String },

    #[error("at most {max} {what} allowed, found {actual}")]
    TooMany {
        max: usize,
        what: &'static str,
        actual: usize,
    },

    #[error("schedule expressions are only supported on the default bus")]
    ScheduleOnCustomBus,

    #[error("{0}")]
    Invalid(String),
}

impl ValidationError {
    /// Diagnostic category this violation is reported under.
    #[must_use]
    pub fn category(&self) -> DiagnosticCategory {
        match self {
            Self::Empty
            | Self::TooLong { .. }
            | Self::ContainsSeparator
            | Self::InvalidCharacters { .. }
            | Self::Duplicate(_)
            | Self::MalformedJson(_)
            | Self::NotAnObject
            | Self::InvalidArn(_)
            | Self::InvalidKey(_)
            | Self::InvalidSchedule(_)
            | Self::UndefinedVariable(_) => DiagnosticCategory::Structural,
            Self::WrongResource { .. }
            | Self::MutuallyExclusive { .. }
            | Self::MissingOneOf { .. }
            | Self::OutOfRange { .. }
            | Self::TooMany { .. }
            | Self::ScheduleOnCustomBus
            | Self::Invalid(_) => DiagnosticCategory::Semantic,
        }
    }
}

fn validate_name(
    name: &str,
    max: usize,
    pattern: &Regex,
    allowed: &'static str,
) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }
    let len = name.chars().count();
    if len > max {
        return Err(ValidationError::TooLong { max, actual: len });
    }
    if name.contains(KEY_SEPARATOR) {
        return Err(ValidationError::ContainsSeparator);
    }
    if !pattern.is_match(name) {
        return Err(ValidationError::InvalidCharacters { allowed });
    }
    Ok(())
}

/// Validate an event bus name.
///
/// Rules:
/// - 1-256 characters long
/// - Only letters, numbers, and `/ . - _`
/// - No `:` (the composite key separator)
/// - Must not start with `aws.`
///
/// # Examples
///
/// ```
/// use rustack_events_core::validation::validate_bus_name;
///
/// assert!(validate_bus_name("orders").is_ok());
/// assert!(validate_bus_name("orders:eu").is_err());
/// ```
pub fn validate_bus_name(name: &str) -> Result<(), ValidationError> {
    validate_name(
        name,
        MAX_BUS_NAME_LEN,
        &BUS_NAME_RE,
        "letters, numbers, and '/ . - _'",
    )?;
    if name.starts_with("aws.") {
        return Err(ValidationError::Invalid(
            "bus names must not start with the reserved prefix 'aws.'".to_owned(),
        ));
    }
    Ok(())
}

/// Validate a rule name: 1-64 characters of letters, numbers, and `. - _`.
pub fn validate_rule_name(name: &str) -> Result<(), ValidationError> {
    validate_name(
        name,
        MAX_NAME_LEN,
        &NAME_RE,
        "letters, numbers, and '. - _'",
    )
}

/// Validate a target id. Same rules as rule names.
pub fn validate_target_id(id: &str) -> Result<(), ValidationError> {
    validate_rule_name(id)
}

/// Validate a connection or API destination name. Same rules as rule names.
pub fn validate_connection_name(name: &str) -> Result<(), ValidationError> {
    validate_rule_name(name)
}

/// Validate an archive name: 1-48 characters of letters, numbers, and `. - _`.
pub fn validate_archive_name(name: &str) -> Result<(), ValidationError> {
    validate_name(
        name,
        MAX_ARCHIVE_NAME_LEN,
        &NAME_RE,
        "letters, numbers, and '. - _'",
    )
}

/// Validate one bus tag.
///
/// Keys are 1-128 characters and must not use the reserved `aws:` prefix;
/// values are at most 256 characters.
pub fn validate_tag(key: &str, value: &str) -> Result<(), ValidationError> {
    if key.is_empty() {
        return Err(ValidationError::Empty);
    }
    let key_len = key.chars().count();
    if key_len > MAX_TAG_KEY_LEN {
        return Err(ValidationError::TooLong {
            max: MAX_TAG_KEY_LEN,
            actual: key_len,
        });
    }
    let value_len = value.chars().count();
    if value_len > MAX_TAG_VALUE_LEN {
        return Err(ValidationError::TooLong {
            max: MAX_TAG_VALUE_LEN,
            actual: value_len,
        });
    }
    if key.starts_with("aws:") {
        return Err(ValidationError::Invalid(
            "tag keys must not use the reserved 'aws:' prefix".to_owned(),
        ));
    }
    Ok(())
}

/// Parse embedded JSON text.
pub fn parse_json(text: &str) -> Result<serde_json::Value, ValidationError> {
    serde_json::from_str(text).map_err(|e| ValidationError::MalformedJson(e.to_string()))
}

/// Parse an event pattern: a non-empty JSON object.
///
/// # Examples
///
/// ```
/// use rustack_events_core::validation::parse_event_pattern;
///
/// assert!(parse_event_pattern(r#"{"source": ["shop"]}"#).is_ok());
/// assert!(parse_event_pattern("[1, 2]").is_err());
/// assert!(parse_event_pattern("{source").is_err());
/// ```
pub fn parse_event_pattern(text: &str) -> Result<serde_json::Value, ValidationError> {
    let value = parse_json(text)?;
    match value.as_object() {
        Some(map) if !map.is_empty() => Ok(value),
        _ => Err(ValidationError::NotAnObject),
    }
}

/// Parse a structured resource identifier.
pub fn parse_arn(text: &str) -> Result<Arn, ValidationError> {
    text.parse()
        .map_err(|e: rustack_core::RustStackError| ValidationError::InvalidArn(e.to_string()))
}

/// Check that `arn` names a resource of the given service and type.
pub fn require_resource(
    arn: &Arn,
    service: &str,
    resource_type: Option<&str>,
    expected: &'static str,
) -> Result<(), ValidationError> {
    if arn.is(service, resource_type) {
        Ok(())
    } else {
        Err(ValidationError::WrongResource {
            expected,
            found: arn.to_string(),
        })
    }
}

/// Validate a JSON path used to select part of an event.
pub fn validate_input_path(path: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::Empty);
    }
    if !path.starts_with('$') || path.chars().any(char::is_whitespace) {
        return Err(ValidationError::Invalid(format!(
            "'{path}' is not a JSON path starting with '$'"
        )));
    }
    Ok(())
}

/// Validate an input transformer variable name.
pub fn validate_template_variable(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }
    if name.starts_with("aws.") {
        return Err(ValidationError::Invalid(format!(
            "variable '{name}' uses the reserved prefix 'aws.'"
        )));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err(ValidationError::InvalidCharacters {
            allowed: "letters, numbers, '_' and '-'",
        });
    }
    Ok(())
}

/// Check that every `<variable>` in `template` is defined by `input_paths`
/// or predefined by EventBridge.
pub fn validate_input_template(
    input_paths: &BTreeMap<String, String>,
    template: &str,
) -> Result<(), ValidationError> {
    if template.is_empty() {
        return Err(ValidationError::Empty);
    }
    for caps in TEMPLATE_VARIABLE_RE.captures_iter(template) {
        let name = &caps[1];
        if !input_paths.contains_key(name) && !PREDEFINED_TEMPLATE_VARIABLES.contains(&name) {
            return Err(ValidationError::UndefinedVariable(name.to_owned()));
        }
    }
    Ok(())
}

/// Validate an alarm period: 10, 30, or a multiple of 60 seconds.
pub fn validate_period(period: u32) -> Result<(), ValidationError> {
    if period == 10 || period == 30 || (period > 0 && period % 60 == 0) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            range: "10, 30, or a multiple of 60 seconds",
            found: period.to_string(),
        })
    }
}

/// Validate a CloudWatch Logs retention period.
pub fn validate_log_retention(days: u32) -> Result<(), ValidationError> {
    if LOG_RETENTION_DAYS.contains(&days) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            range: "a CloudWatch Logs retention value (1, 3, 5, 7, 14, 30, ... 3653)",
            found: days.to_string(),
        })
    }
}

/// Validate a bus policy statement id: 1-64 characters of letters, numbers,
/// `-` and `_`.
pub fn validate_statement_id(id: &str) -> Result<(), ValidationError> {
    validate_name(
        id,
        MAX_STATEMENT_ID_LEN,
        &STATEMENT_ID_RE,
        "letters, numbers, '-' and '_'",
    )
}

/// Validate a bus policy principal.
///
/// The principal is a 12-digit account ID, or `*` restricted to an
/// organization.
pub fn validate_principal(
    principal: &str,
    organization_id: Option<&str>,
) -> Result<(), ValidationError> {
    match principal {
        "" => Err(ValidationError::Empty),
        "*" if organization_id.is_none() => Err(ValidationError::Invalid(
            "principal '*' requires organization_id".to_owned(),
        )),
        "*" => Ok(()),
        p if AccountId::is_valid(p) => Ok(()),
        p => Err(ValidationError::Invalid(format!(
            "principal '{p}' must be a 12-digit account ID or '*'"
        ))),
    }
}

/// Validate an AWS Organizations id (`o-` followed by 10-32 characters).
pub fn validate_organization_id(id: &str) -> Result<(), ValidationError> {
    if ORGANIZATION_ID_RE.is_match(id) {
        Ok(())
    } else {
        Err(ValidationError::Invalid(format!(
            "'{id}' is not an organization id"
        )))
    }
}

/// Validate an SQS queue name.
pub fn validate_queue_name(name: &str) -> Result<(), ValidationError> {
    validate_name(
        name,
        MAX_QUEUE_NAME_LEN,
        &QUEUE_NAME_RE,
        "letters, numbers, '-' and '_', with an optional '.fifo' suffix",
    )
}

/// Validate an HTTPS endpoint.
pub fn validate_https_endpoint(url: &str) -> Result<(), ValidationError> {
    match url.strip_prefix("https://") {
        Some(rest) if !rest.is_empty() && !rest.chars().any(char::is_whitespace) => Ok(()),
        _ => Err(ValidationError::Invalid(format!(
            "'{url}' is not an https:// endpoint"
        ))),
    }
}

fn non_empty(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        Err(ValidationError::Empty)
    } else {
        Ok(())
    }
}

fn finite(value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            range: "a finite number",
            found: value.to_string(),
        })
    }
}

fn in_range<T: PartialOrd + Display>(
    value: T,
    range: &RangeInclusive<T>,
    description: &'static str,
) -> Result<T, ValidationError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::OutOfRange {
            range: description,
            found: value.to_string(),
        })
    }
}

/// Validate a whole specification.
///
/// Every check runs even after a failure; the returned diagnostics are
/// ordered by document position.
///
/// # Errors
///
/// Returns every structural and semantic violation found.
pub fn validate(spec: &EventRoutingSpec) -> Result<ValidatedSpec, Diagnostics> {
    let mut v = Validator::default();

    let mut buses = Vec::with_capacity(spec.buses.len());
    let mut seen = BTreeSet::new();
    for (i, bus) in spec.buses.iter().enumerate() {
        let path = format!("buses[{i}]");
        v.unique(&mut seen, &format!("{path}.name"), &bus.name);
        buses.push(v.bus(&path, bus));
    }

    for (key, alarm) in &spec.alarms {
        v.alarm(key, alarm);
    }
    for (key, alarm) in &spec.anomaly_alarms {
        v.anomaly_alarm(key, alarm);
    }
    for (key, alarm) in &spec.dead_letter_alarms {
        v.dead_letter_alarm(key, alarm);
    }
    v.toggles(&spec.observability);

    let archives = spec
        .archives
        .iter()
        .filter_map(|(name, archive)| Some((name.clone(), v.archive(name, archive)?)))
        .collect();

    let mut statements = BTreeSet::new();
    let mut permissions = BTreeMap::new();
    for (key, permission) in &spec.permissions {
        let validated = v.permission(key, permission);
        if !statements.insert((permission.bus.as_str(), permission.statement_id.as_str())) {
            v.report(
                &format!("permissions.{key}.statement_id"),
                ValidationError::Duplicate(permission.statement_id.clone()),
            );
        } else if let Some(p) = validated {
            permissions.insert(key.clone(), p);
        }
    }

    let connections = spec
        .connections
        .iter()
        .filter_map(|(name, c)| Some((name.clone(), v.connection(name, c)?)))
        .collect();
    let api_destinations = spec
        .api_destinations
        .iter()
        .filter_map(|(name, d)| Some((name.clone(), v.api_destination(name, d)?)))
        .collect();

    debug!(
        buses = spec.buses.len(),
        diagnostics = v.diagnostics.len(),
        "validated routing specification"
    );

    if !v.diagnostics.is_empty() {
        return Err(v.diagnostics);
    }

    Ok(ValidatedSpec {
        buses,
        alarms: spec.alarms.clone(),
        anomaly_alarms: spec.anomaly_alarms.clone(),
        dead_letter_alarms: spec.dead_letter_alarms.clone(),
        observability: spec.observability.clone(),
        archives,
        permissions,
        connections,
        api_destinations,
    })
}

/// Collect-all walker over the raw document.
#[derive(Debug, Default)]
struct Validator {
    diagnostics: Diagnostics,
}

impl Validator {
    fn report(&mut self, path: &str, err: ValidationError) {
        self.diagnostics
            .push(Diagnostic::new(err.category(), path, err.to_string()));
    }

    fn check<T>(&mut self, path: &str, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.report(path, err);
                None
            }
        }
    }

    /// Record a duplicate; empty names are reported by the name check.
    fn unique<'a>(&mut self, seen: &mut BTreeSet<&'a str>, path: &str, name: &'a str) {
        if !name.is_empty() && !seen.insert(name) {
            self.report(path, ValidationError::Duplicate(name.to_owned()));
        }
    }

    fn description(&mut self, path: &str, description: Option<&str>) {
        if let Some(text) = description {
            let len = text.chars().count();
            if len > MAX_DESCRIPTION_LEN {
                self.report(
                    &format!("{path}.description"),
                    ValidationError::TooLong {
                        max: MAX_DESCRIPTION_LEN,
                        actual: len,
                    },
                );
            }
        }
    }

    /// `Some(None)` when absent, `None` when present but invalid.
    fn optional_arn(
        &mut self,
        path: &str,
        value: Option<&str>,
        expect: impl FnOnce(&Arn) -> Result<(), ValidationError>,
    ) -> Option<Option<Arn>> {
        match value {
            None => Some(None),
            Some(text) => self
                .check(path, parse_arn(text).and_then(|arn| expect(&arn).map(|()| arn)))
                .map(Some),
        }
    }

    fn role_arn(&mut self, path: &str, value: Option<&str>) -> Option<Option<Arn>> {
        self.optional_arn(&format!("{path}.role_arn"), value, |arn| {
            require_resource(arn, "iam", Some("role"), "an IAM role ARN")
        })
    }

    fn tags(&mut self, path: &str, tags: &BTreeMap<String, String>) {
        if tags.len() > MAX_TAGS {
            self.report(
                &format!("{path}.tags"),
                ValidationError::TooMany {
                    max: MAX_TAGS,
                    what: "tags",
                    actual: tags.len(),
                },
            );
        }
        for (key, value) in tags {
            self.check(&format!("{path}.tags.{key}"), validate_tag(key, value));
        }
    }

    fn bus(&mut self, path: &str, bus: &BusSpec) -> Bus {
        self.check(&format!("{path}.name"), validate_bus_name(&bus.name));
        self.description(path, bus.description.as_deref());
        self.tags(path, &bus.tags);
        if bus.name == DEFAULT_BUS && (!bus.tags.is_empty() || bus.prevent_destroy) {
            self.report(
                path,
                ValidationError::Invalid(
                    "the default bus is not managed; tags and prevent_destroy cannot be set"
                        .to_owned(),
                ),
            );
        }

        let mut seen = BTreeSet::new();
        let mut rules = Vec::with_capacity(bus.rules.len());
        for (j, rule) in bus.rules.iter().enumerate() {
            let rule_path = format!("{path}.rules[{j}]");
            self.unique(&mut seen, &format!("{rule_path}.name"), &rule.name);
            if let Some(rule) = self.rule(&rule_path, &bus.name, rule) {
                rules.push(rule);
            }
        }

        Bus {
            name: bus.name.clone(),
            description: bus.description.clone(),
            tags: bus.tags.clone(),
            prevent_destroy: bus.prevent_destroy,
            rules,
        }
    }

    fn rule(&mut self, path: &str, bus: &str, rule: &RuleSpec) -> Option<Rule> {
        self.check(&format!("{path}.name"), validate_rule_name(&rule.name));
        self.description(path, rule.description.as_deref());

        let trigger = match (&rule.event_pattern, &rule.schedule_expression) {
            (Some(_), Some(_)) => {
                self.report(
                    path,
                    ValidationError::MutuallyExclusive {
                        fields: "event_pattern and schedule_expression",
                    },
                );
                None
            }
            (None, None) => {
                self.report(
                    path,
                    ValidationError::MissingOneOf {
                        fields: "event_pattern or schedule_expression",
                    },
                );
                None
            }
            (Some(pattern), None) => self
                .check(
                    &format!("{path}.event_pattern"),
                    parse_event_pattern(pattern),
                )
                .map(|pattern| RuleTrigger::Pattern { pattern }),
            (None, Some(schedule)) => {
                let schedule_path = format!("{path}.schedule_expression");
                if bus != DEFAULT_BUS {
                    self.report(&schedule_path, ValidationError::ScheduleOnCustomBus);
                }
                self.check(
                    &schedule_path,
                    schedule
                        .parse::<ScheduleExpression>()
                        .map_err(ValidationError::from),
                )
                .map(|expression| RuleTrigger::Schedule { expression })
            }
        };
        let role_arn = self.role_arn(path, rule.role_arn.as_deref());

        if rule.targets.len() > MAX_TARGETS_PER_RULE {
            self.report(
                &format!("{path}.targets"),
                ValidationError::TooMany {
                    max: MAX_TARGETS_PER_RULE,
                    what: "targets per rule",
                    actual: rule.targets.len(),
                },
            );
        }

        let mut seen = BTreeSet::new();
        let mut targets = Vec::with_capacity(rule.targets.len());
        for (k, target) in rule.targets.iter().enumerate() {
            let target_path = format!("{path}.targets[{k}]");
            self.unique(&mut seen, &format!("{target_path}.id"), &target.id);
            if let Some(target) = self.target(&target_path, target) {
                targets.push(target);
            }
        }

        Some(Rule {
            name: rule.name.clone(),
            description: rule.description.clone(),
            state: rule.enabled.into(),
            trigger: trigger?,
            role_arn: role_arn?,
            targets,
        })
    }

    fn target(&mut self, path: &str, target: &TargetSpec) -> Option<Target> {
        self.check(&format!("{path}.id"), validate_target_id(&target.id));
        let arn = self.check(&format!("{path}.arn"), parse_arn(&target.arn));
        let input = self.target_input(path, target);
        let dead_letter_arn = self.optional_arn(
            &format!("{path}.dead_letter_arn"),
            target.dead_letter_arn.as_deref(),
            |arn| require_resource(arn, "sqs", None, "an SQS queue ARN"),
        );
        let role_arn = self.role_arn(path, target.role_arn.as_deref());
        let retry_policy = match target.retry_policy {
            None => Some(None),
            Some(spec) => self
                .retry_policy(&format!("{path}.retry_policy"), spec)
                .map(Some),
        };

        if target.attach_lambda_permission {
            if let Some(arn) = &arn {
                self.check(
                    &format!("{path}.attach_lambda_permission"),
                    require_resource(arn, "lambda", Some("function"), "a Lambda function ARN"),
                );
            }
        }

        Some(Target {
            id: target.id.clone(),
            arn: arn?,
            input: input?,
            dead_letter_arn: dead_letter_arn?,
            retry_policy: retry_policy?,
            role_arn: role_arn?,
            attach_lambda_permission: target.attach_lambda_permission,
        })
    }

    fn target_input(&mut self, path: &str, target: &TargetSpec) -> Option<TargetInput> {
        let variants = [
            target.input.is_some(),
            target.input_path.is_some(),
            target.input_transformer.is_some(),
        ];
        if variants.iter().filter(|set| **set).count() > 1 {
            self.report(
                path,
                ValidationError::MutuallyExclusive {
                    fields: "input, input_path and input_transformer",
                },
            );
            return None;
        }

        if let Some(text) = &target.input {
            self.check(&format!("{path}.input"), parse_json(text))
                .map(|value| TargetInput::Constant { value })
        } else if let Some(json_path) = &target.input_path {
            self.check(&format!("{path}.input_path"), validate_input_path(json_path))
                .map(|()| TargetInput::Path {
                    path: json_path.clone(),
                })
        } else if let Some(transformer) = &target.input_transformer {
            self.input_transformer(&format!("{path}.input_transformer"), transformer)
        } else {
            Some(TargetInput::Matched)
        }
    }

    fn input_transformer(
        &mut self,
        path: &str,
        transformer: &InputTransformerSpec,
    ) -> Option<TargetInput> {
        let mut ok = true;
        if transformer.input_paths.len() > MAX_INPUT_PATHS {
            self.report(
                &format!("{path}.input_paths"),
                ValidationError::TooMany {
                    max: MAX_INPUT_PATHS,
                    what: "input paths",
                    actual: transformer.input_paths.len(),
                },
            );
            ok = false;
        }
        for (name, json_path) in &transformer.input_paths {
            let var_path = format!("{path}.input_paths.{name}");
            ok &= self
                .check(&var_path, validate_template_variable(name))
                .is_some();
            ok &= self
                .check(&var_path, validate_input_path(json_path))
                .is_some();
        }
        ok &= self
            .check(
                &format!("{path}.input_template"),
                validate_input_template(&transformer.input_paths, &transformer.input_template),
            )
            .is_some();

        ok.then(|| TargetInput::Transform {
            input_paths: transformer.input_paths.clone(),
            input_template: transformer.input_template.clone(),
        })
    }

    fn retry_policy(&mut self, path: &str, spec: RetryPolicySpec) -> Option<RetryPolicy> {
        let defaults = RetryPolicy::default();
        let age = self.check(
            &format!("{path}.maximum_event_age_in_seconds"),
            in_range(
                spec.maximum_event_age_in_seconds
                    .unwrap_or(defaults.maximum_event_age_in_seconds),
                &(RetryPolicy::MIN_EVENT_AGE..=RetryPolicy::MAX_EVENT_AGE),
                "between 60 and 86400 seconds",
            ),
        );
        let attempts = self.check(
            &format!("{path}.maximum_retry_attempts"),
            in_range(
                spec.maximum_retry_attempts
                    .unwrap_or(defaults.maximum_retry_attempts),
                &(0..=RetryPolicy::MAX_RETRY_ATTEMPTS),
                "between 0 and 185",
            ),
        );
        Some(RetryPolicy {
            maximum_event_age_in_seconds: age?,
            maximum_retry_attempts: attempts?,
        })
    }

    fn alarm_header(&mut self, path: &str, key: &str, alarm_name: Option<&str>) {
        if key.is_empty() {
            self.report(path, ValidationError::Empty);
        }
        if let Some(name) = alarm_name {
            let len = name.chars().count();
            let result = if name.is_empty() {
                Err(ValidationError::Empty)
            } else if len > MAX_ALARM_NAME_LEN {
                Err(ValidationError::TooLong {
                    max: MAX_ALARM_NAME_LEN,
                    actual: len,
                })
            } else {
                Ok(())
            };
            self.check(&format!("{path}.alarm_name"), result);
        }
    }

    fn rule_key(&mut self, path: &str, rule_key: Option<&str>) {
        if let Some(key) = rule_key {
            self.check(
                &format!("{path}.rule_key"),
                key.parse::<RuleKey>()
                    .map_err(|e| ValidationError::InvalidKey(e.to_string())),
            );
        }
    }

    fn evaluation(&mut self, path: &str, evaluation: &Evaluation) {
        let periods = self.check(
            &format!("{path}.evaluation_periods"),
            in_range(evaluation.evaluation_periods, &(1..=u32::MAX), "at least 1"),
        );
        if let (Some(periods), Some(datapoints)) = (periods, evaluation.datapoints_to_alarm) {
            self.check(
                &format!("{path}.datapoints_to_alarm"),
                in_range(
                    datapoints,
                    &(1..=periods),
                    "between 1 and evaluation_periods",
                ),
            );
        }
        let period = self.check(&format!("{path}.period"), validate_period(evaluation.period));
        if let (Some(periods), Some(())) = (periods, period) {
            let window = u64::from(periods) * u64::from(evaluation.period);
            self.check(
                &format!("{path}.evaluation_periods"),
                in_range(
                    window,
                    &(1..=MAX_EVALUATION_SECONDS),
                    "an evaluation window (evaluation_periods * period) of at most 604800 seconds",
                ),
            );
        }
    }

    fn dimensions(&mut self, path: &str, dimensions: &BTreeMap<String, String>) {
        if dimensions.len() > MAX_DIMENSIONS {
            self.report(
                &format!("{path}.dimensions"),
                ValidationError::TooMany {
                    max: MAX_DIMENSIONS,
                    what: "dimensions",
                    actual: dimensions.len(),
                },
            );
        }
        for (name, value) in dimensions {
            let dim_path = format!("{path}.dimensions.{name}");
            self.check(&dim_path, non_empty(name));
            self.check(&dim_path, non_empty(value));
        }
    }

    fn actions(&mut self, path: &str, actions: &AlarmActions) {
        for (field, arns) in [
            ("alarm_actions", &actions.alarm_actions),
            ("ok_actions", &actions.ok_actions),
        ] {
            for (i, arn) in arns.iter().enumerate() {
                self.check(&format!("{path}.{field}[{i}]"), parse_arn(arn));
            }
        }
    }

    fn alarm(&mut self, key: &str, alarm: &AlarmSpec) {
        let path = format!("alarms.{key}");
        self.alarm_header(&path, key, alarm.alarm_name.as_deref());
        if !alarm.enabled {
            return;
        }
        self.description(&path, alarm.description.as_deref());
        self.check(&format!("{path}.namespace"), non_empty(&alarm.namespace));
        self.check(&format!("{path}.metric_name"), non_empty(&alarm.metric_name));
        self.rule_key(&path, alarm.rule_key.as_deref());
        if alarm.comparison_operator.is_band() {
            self.report(
                &format!("{path}.comparison_operator"),
                ValidationError::Invalid(
                    "band comparison operators are only valid on anomaly alarms".to_owned(),
                ),
            );
        }
        self.check(&format!("{path}.threshold"), finite(alarm.threshold));
        self.evaluation(&path, &alarm.evaluation);
        self.dimensions(&path, &alarm.dimensions);
        self.actions(&path, &alarm.actions);
    }

    fn anomaly_alarm(&mut self, key: &str, alarm: &AnomalyAlarmSpec) {
        let path = format!("anomaly_alarms.{key}");
        self.alarm_header(&path, key, alarm.alarm_name.as_deref());
        if !alarm.enabled {
            return;
        }
        self.description(&path, alarm.description.as_deref());
        self.check(&format!("{path}.namespace"), non_empty(&alarm.namespace));
        self.check(&format!("{path}.metric_name"), non_empty(&alarm.metric_name));
        self.rule_key(&path, alarm.rule_key.as_deref());
        if !alarm.comparison_operator.is_band() {
            self.report(
                &format!("{path}.comparison_operator"),
                ValidationError::Invalid(
                    "anomaly alarms require a band comparison operator".to_owned(),
                ),
            );
        }
        let width_ok = alarm.band_width.is_finite()
            && alarm.band_width > 0.0
            && alarm.band_width <= MAX_BAND_WIDTH;
        if !width_ok {
            self.report(
                &format!("{path}.band_width"),
                ValidationError::OutOfRange {
                    range: "greater than 0 and at most 10",
                    found: alarm.band_width.to_string(),
                },
            );
        }
        self.evaluation(&path, &alarm.evaluation);
        self.dimensions(&path, &alarm.dimensions);
        self.actions(&path, &alarm.actions);
    }

    fn dead_letter_alarm(&mut self, key: &str, alarm: &DeadLetterAlarmSpec) {
        let path = format!("dead_letter_alarms.{key}");
        self.alarm_header(&path, key, alarm.alarm_name.as_deref());
        if !alarm.enabled {
            return;
        }
        self.description(&path, alarm.description.as_deref());
        if let Some(target_key) = &alarm.target_key {
            self.check(
                &format!("{path}.target_key"),
                target_key
                    .parse::<TargetKey>()
                    .map_err(|e| ValidationError::InvalidKey(e.to_string())),
            );
        }
        if let Some(name) = &alarm.queue_name {
            self.check(&format!("{path}.queue_name"), validate_queue_name(name));
        }
        if let Some(arn) = &alarm.queue_arn {
            self.check(&format!("{path}.queue_arn"), parse_arn(arn));
        }
        if alarm.comparison_operator.is_band() {
            self.report(
                &format!("{path}.comparison_operator"),
                ValidationError::Invalid(
                    "band comparison operators are only valid on anomaly alarms".to_owned(),
                ),
            );
        }
        self.check(&format!("{path}.threshold"), finite(alarm.threshold));
        self.evaluation(&path, &alarm.evaluation);
        self.actions(&path, &alarm.actions);
    }

    fn toggles(&mut self, toggles: &ObservabilityToggles) {
        let path = "observability";
        self.check(
            &format!("{path}.log_retention_days"),
            validate_log_retention(toggles.log_retention_days),
        );
        let rate = toggles.log_sampling_rate;
        if !(rate.is_finite() && rate > 0.0 && rate <= 1.0) {
            self.report(
                &format!("{path}.log_sampling_rate"),
                ValidationError::OutOfRange {
                    range: "greater than 0 and at most 1",
                    found: rate.to_string(),
                },
            );
        }
        for (field, value) in [
            (
                "failed_invocations_threshold",
                toggles.failed_invocations_threshold,
            ),
            ("throttled_rules_threshold", toggles.throttled_rules_threshold),
            ("dead_letter_threshold", toggles.dead_letter_threshold),
        ] {
            self.check(&format!("{path}.{field}"), finite(value));
        }
        self.evaluation(
            path,
            &Evaluation {
                evaluation_periods: toggles.evaluation_periods,
                period: toggles.period,
                ..Evaluation::default()
            },
        );
        self.actions(
            path,
            &AlarmActions {
                alarm_actions: toggles.alarm_actions.clone(),
                ok_actions: toggles.ok_actions.clone(),
            },
        );
    }

    fn archive(&mut self, name: &str, archive: &ArchiveSpec) -> Option<Archive> {
        let path = format!("archives.{name}");
        let name_ok = self.check(&path, validate_archive_name(name));
        let bus_ok = self.check(
            &format!("{path}.source_bus"),
            validate_bus_name(&archive.source_bus),
        );
        self.description(&path, archive.description.as_deref());
        let event_pattern = match &archive.event_pattern {
            None => Some(None),
            Some(text) => self
                .check(&format!("{path}.event_pattern"), parse_event_pattern(text))
                .map(Some),
        };
        let retention = self.check(
            &format!("{path}.retention_days"),
            in_range(
                archive.retention_days,
                &(0..=MAX_ARCHIVE_RETENTION_DAYS),
                "between 0 (indefinite) and 36500 days",
            ),
        );

        name_ok?;
        bus_ok?;
        Some(Archive {
            name: name.to_owned(),
            source_bus: archive.source_bus.clone(),
            description: archive.description.clone(),
            event_pattern: event_pattern?,
            retention_days: retention?,
        })
    }

    fn permission(&mut self, key: &str, permission: &PermissionSpec) -> Option<Permission> {
        let path = format!("permissions.{key}");
        let key_ok = self.check(&path, non_empty(key));
        let bus_ok = self.check(&format!("{path}.bus"), validate_bus_name(&permission.bus));
        let statement_ok = self.check(
            &format!("{path}.statement_id"),
            validate_statement_id(&permission.statement_id),
        );
        let principal_ok = self.check(
            &format!("{path}.principal"),
            validate_principal(&permission.principal, permission.organization_id.as_deref()),
        );
        let organization_ok = match &permission.organization_id {
            None => Some(()),
            Some(id) => self.check(
                &format!("{path}.organization_id"),
                validate_organization_id(id),
            ),
        };
        let action_ok = if permission.action == PUT_EVENTS_ACTION {
            Some(())
        } else {
            self.report(
                &format!("{path}.action"),
                ValidationError::Invalid(format!(
                    "action must be '{PUT_EVENTS_ACTION}', found '{}'",
                    permission.action
                )),
            );
            None
        };

        key_ok?;
        bus_ok?;
        statement_ok?;
        principal_ok?;
        organization_ok?;
        action_ok?;
        Some(Permission {
            bus: permission.bus.clone(),
            statement_id: permission.statement_id.clone(),
            principal: permission.principal.clone(),
            action: permission.action.clone(),
            organization_id: permission.organization_id.clone(),
        })
    }

    fn connection(&mut self, name: &str, connection: &ConnectionSpec) -> Option<Connection> {
        let path = format!("connections.{name}");
        let name_ok = self.check(&path, validate_connection_name(name));
        self.description(&path, connection.description.as_deref());

        let blocks = [
            connection.basic.is_some(),
            connection.api_key.is_some(),
            connection.oauth.is_some(),
        ];
        if blocks.iter().filter(|set| **set).count() > 1 {
            self.report(
                &path,
                ValidationError::MutuallyExclusive {
                    fields: "basic, api_key and oauth",
                },
            );
            return None;
        }

        let missing = |block: &str| {
            ValidationError::Invalid(format!(
                "authorization_type {} requires the '{block}' block",
                connection.authorization_type
            ))
        };
        let auth = match connection.authorization_type {
            AuthorizationType::Basic => match &connection.basic {
                None => Err(missing("basic")),
                Some(basic) => {
                    let username = self.check(
                        &format!("{path}.basic.username"),
                        non_empty(&basic.username),
                    );
                    let password = self.check(
                        &format!("{path}.basic.password"),
                        non_empty(&basic.password),
                    );
                    Ok(username.and(password).map(|()| ConnectionAuth::Basic {
                        username: basic.username.clone(),
                        password: basic.password.clone(),
                    }))
                }
            },
            AuthorizationType::ApiKey => match &connection.api_key {
                None => Err(missing("api_key")),
                Some(api_key) => {
                    let key =
                        self.check(&format!("{path}.api_key.key"), non_empty(&api_key.key));
                    let value = self.check(
                        &format!("{path}.api_key.value"),
                        non_empty(&api_key.value),
                    );
                    Ok(key.and(value).map(|()| ConnectionAuth::ApiKey {
                        key: api_key.key.clone(),
                        value: api_key.value.clone(),
                    }))
                }
            },
            AuthorizationType::OauthClientCredentials => match &connection.oauth {
                None => Err(missing("oauth")),
                Some(oauth) => {
                    let endpoint = self.check(
                        &format!("{path}.oauth.authorization_endpoint"),
                        validate_https_endpoint(&oauth.authorization_endpoint),
                    );
                    let method = self.check(
                        &format!("{path}.oauth.http_method"),
                        one_of(&oauth.http_method, &OAUTH_METHODS),
                    );
                    let client_id = self.check(
                        &format!("{path}.oauth.client_id"),
                        non_empty(&oauth.client_id),
                    );
                    let secret = self.check(
                        &format!("{path}.oauth.client_secret"),
                        non_empty(&oauth.client_secret),
                    );
                    Ok(endpoint
                        .and(method)
                        .and(client_id)
                        .and(secret)
                        .map(|()| ConnectionAuth::OauthClientCredentials {
                            authorization_endpoint: oauth.authorization_endpoint.clone(),
                            http_method: oauth.http_method.clone(),
                            client_id: oauth.client_id.clone(),
                            client_secret: oauth.client_secret.clone(),
                        }))
                }
            },
        };
        let auth = match auth {
            Ok(auth) => auth,
            Err(err) => {
                self.report(&format!("{path}.authorization_type"), err);
                None
            }
        };

        name_ok?;
        Some(Connection {
            name: name.to_owned(),
            description: connection.description.clone(),
            auth: auth?,
        })
    }

    fn api_destination(
        &mut self,
        name: &str,
        destination: &ApiDestinationSpec,
    ) -> Option<ApiDestination> {
        let path = format!("api_destinations.{name}");
        let name_ok = self.check(&path, validate_connection_name(name));
        let connection_ok = self.check(
            &format!("{path}.connection"),
            validate_connection_name(&destination.connection),
        );
        self.description(&path, destination.description.as_deref());
        let endpoint_ok = self.check(
            &format!("{path}.invocation_endpoint"),
            validate_https_endpoint(&destination.invocation_endpoint),
        );
        let method_ok = self.check(
            &format!("{path}.http_method"),
            one_of(&destination.http_method, &API_DESTINATION_METHODS),
        );
        let rate = self.check(
            &format!("{path}.invocation_rate_limit_per_second"),
            in_range(
                destination.invocation_rate_limit_per_second,
                &(1..=MAX_INVOCATION_RATE),
                "between 1 and 300",
            ),
        );

        name_ok?;
        connection_ok?;
        endpoint_ok?;
        method_ok?;
        Some(ApiDestination {
            name: name.to_owned(),
            connection: destination.connection.clone(),
            description: destination.description.clone(),
            invocation_endpoint: destination.invocation_endpoint.clone(),
            http_method: destination.http_method.clone(),
            invocation_rate_limit_per_second: rate?,
        })
    }
}

fn one_of(value: &str, allowed: &[&str]) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::Invalid(format!(
            "'{value}' must be one of {}",
            allowed.join(", ")
        )))
    }
}
