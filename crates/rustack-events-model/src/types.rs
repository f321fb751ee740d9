//! Typed values produced by validation.
//!
//! The raw specification carries mutually exclusive optional fields; once
//! validated they are represented as sum types so that later stages never see
//! an impossible combination.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static RATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^rate\((\d+) (minute|minutes|hour|hours|day|days)\)$").expect("valid regex")
});

static CRON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^cron\(([^()]+)\)$").expect("valid regex"));

/// Number of fields in an EventBridge cron expression.
const CRON_FIELDS: usize = 6;

/// Error returned for a malformed schedule expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("expected 'rate(<value> <unit>)' or 'cron(<fields>)'")]
    Syntax,
    #[error("rate value must be a positive integer")]
    ZeroRate,
    #[error("rate unit must be singular for a value of 1 and plural otherwise")]
    UnitNumber,
    #[error("cron expression must have {CRON_FIELDS} fields, found {0}")]
    CronFields(usize),
    #[error("cron expression must use '?' in either day-of-month or day-of-week")]
    CronDayWildcard,
}

/// Unit of a `rate(...)` schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateUnit {
    Minute,
    Hour,
    Day,
}

impl RateUnit {
    fn name(self, value: u32) -> &'static str {
        match (self, value == 1) {
            (Self::Minute, true) => "minute",
            (Self::Minute, false) => "minutes",
            (Self::Hour, true) => "hour",
            (Self::Hour, false) => "hours",
            (Self::Day, true) => "day",
            (Self::Day, false) => "days",
        }
    }
}

/// A parsed schedule expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScheduleExpression {
    /// `rate(5 minutes)`.
    Rate { value: u32, unit: RateUnit },
    /// `cron(0 12 * * ? *)`, fields normalized to single spaces.
    Cron(Vec<String>),
}

impl FromStr for ScheduleExpression {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(caps) = RATE_RE.captures(s) {
            let value: u32 = caps[1].parse().map_err(|_| ScheduleError::Syntax)?;
            if value == 0 {
                return Err(ScheduleError::ZeroRate);
            }
            let (unit, singular) = match &caps[2] {
                "minute" => (RateUnit::Minute, true),
                "minutes" => (RateUnit::Minute, false),
                "hour" => (RateUnit::Hour, true),
                "hours" => (RateUnit::Hour, false),
                "day" => (RateUnit::Day, true),
                _ => (RateUnit::Day, false),
            };
            if singular != (value == 1) {
                return Err(ScheduleError::UnitNumber);
            }
            return Ok(Self::Rate { value, unit });
        }

        if let Some(caps) = CRON_RE.captures(s) {
            let fields: Vec<String> = caps[1].split_whitespace().map(str::to_owned).collect();
            if fields.len() != CRON_FIELDS {
                return Err(ScheduleError::CronFields(fields.len()));
            }
            // day-of-month is field 3, day-of-week field 5
            if fields[2] != "?" && fields[4] != "?" {
                return Err(ScheduleError::CronDayWildcard);
            }
            return Ok(Self::Cron(fields));
        }

        Err(ScheduleError::Syntax)
    }
}

impl fmt::Display for ScheduleExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rate { value, unit } => write!(f, "rate({value} {})", unit.name(*value)),
            Self::Cron(fields) => write!(f, "cron({})", fields.join(" ")),
        }
    }
}

impl Serialize for ScheduleExpression {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScheduleExpression {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// What triggers a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleTrigger {
    /// Events matching a pattern.
    Pattern { pattern: serde_json::Value },
    /// A fixed schedule.
    Schedule { expression: ScheduleExpression },
}

impl RuleTrigger {
    /// The event pattern, if pattern-triggered.
    #[must_use]
    pub fn pattern(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Pattern { pattern } => Some(pattern),
            Self::Schedule { .. } => None,
        }
    }

    /// The schedule, if schedule-triggered.
    #[must_use]
    pub fn schedule(&self) -> Option<&ScheduleExpression> {
        match self {
            Self::Schedule { expression } => Some(expression),
            Self::Pattern { .. } => None,
        }
    }
}

/// What is delivered to a target.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetInput {
    /// The matched event, unchanged.
    #[default]
    Matched,
    /// A static JSON payload.
    Constant { value: serde_json::Value },
    /// Part of the event selected by a JSON path.
    Path { path: String },
    /// A template filled from JSON paths of the event.
    Transform {
        input_paths: BTreeMap<String, String>,
        input_template: String,
    },
}

/// Resolved delivery retry bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub maximum_event_age_in_seconds: u32,
    pub maximum_retry_attempts: u32,
}

impl RetryPolicy {
    /// Largest accepted event age.
    pub const MAX_EVENT_AGE: u32 = 86_400;
    /// Smallest accepted event age.
    pub const MIN_EVENT_AGE: u32 = 60;
    /// Largest accepted retry count.
    pub const MAX_RETRY_ATTEMPTS: u32 = 185;
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            maximum_event_age_in_seconds: Self::MAX_EVENT_AGE,
            maximum_retry_attempts: Self::MAX_RETRY_ATTEMPTS,
        }
    }
}

/// Authorization scheme of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationType {
    Basic,
    ApiKey,
    OauthClientCredentials,
}

impl AuthorizationType {
    /// Wire-format name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "BASIC",
            Self::ApiKey => "API_KEY",
            Self::OauthClientCredentials => "OAUTH_CLIENT_CREDENTIALS",
        }
    }
}

impl fmt::Display for AuthorizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated connection credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "authorization_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionAuth {
    Basic {
        username: String,
        password: String,
    },
    ApiKey {
        key: String,
        value: String,
    },
    OauthClientCredentials {
        authorization_endpoint: String,
        http_method: String,
        client_id: String,
        client_secret: String,
    },
}

/// Whether a rule is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleState {
    Enabled,
    Disabled,
}

impl From<bool> for RuleState {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Enabled } else { Self::Disabled }
    }
}

/// Where a merged observability object came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Generated by a feature toggle.
    Synthesized,
    /// Authored by the user under a key no default uses.
    User,
    /// Authored by the user under the key of a synthesized default.
    Overridden,
}

impl Origin {
    /// Whether the object was authored by the user.
    #[must_use]
    pub fn is_user(&self) -> bool {
        matches!(self, Self::User | Self::Overridden)
    }
}
