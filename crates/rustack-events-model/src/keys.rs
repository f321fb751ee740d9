//! Composite keys addressing flattened rules and targets.
//!
//! Every rule is addressed as `<bus>:<rule>` and every target as
//! `<bus>:<rule>:<target>`. Names are validated to never contain the
//! separator, so a key splits back into its parts unambiguously.

use std::fmt;
use std::str::FromStr;

/// Separator between the parts of a composite key.
pub const KEY_SEPARATOR: char = ':';

/// Name of the distinguished default event bus.
pub const DEFAULT_BUS: &str = "default";

/// Error returned when a string is not a well-formed composite key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{key}' is not a valid {kind} key (expected {expected})")]
pub struct KeyParseError {
    key: String,
    kind: &'static str,
    expected: &'static str,
}

/// Address of a rule: `<bus>:<rule>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleKey {
    bus: String,
    rule: String,
}

impl RuleKey {
    /// Build a key from already-validated names.
    #[must_use]
    pub fn new(bus: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            bus: bus.into(),
            rule: rule.into(),
        }
    }

    /// Owning bus name.
    #[must_use]
    pub fn bus(&self) -> &str {
        &self.bus
    }

    /// Rule name within the bus.
    #[must_use]
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// Whether the rule lives on the default bus.
    #[must_use]
    pub fn is_default_bus(&self) -> bool {
        self.bus == DEFAULT_BUS
    }

    /// Key of a target attached to this rule.
    #[must_use]
    pub fn target(&self, id: impl Into<String>) -> TargetKey {
        TargetKey {
            rule: self.clone(),
            target: id.into(),
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", self.bus, self.rule)
    }
}

impl FromStr for RuleKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match split_key::<2>(s) {
            Some([bus, rule]) => Ok(Self::new(bus, rule)),
            None => Err(KeyParseError {
                key: s.to_owned(),
                kind: "rule",
                expected: "<bus>:<rule>",
            }),
        }
    }
}

/// Address of a target: `<bus>:<rule>:<target>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetKey {
    rule: RuleKey,
    target: String,
}

impl TargetKey {
    /// Build a key from already-validated names.
    #[must_use]
    pub fn new(bus: impl Into<String>, rule: impl Into<String>, target: impl Into<String>) -> Self {
        RuleKey::new(bus, rule).target(target)
    }

    /// Key of the owning rule.
    #[must_use]
    pub fn rule_key(&self) -> &RuleKey {
        &self.rule
    }

    /// Owning bus name.
    #[must_use]
    pub fn bus(&self) -> &str {
        self.rule.bus()
    }

    /// Target id within the rule.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{KEY_SEPARATOR}{}", self.rule, self.target)
    }
}

impl FromStr for TargetKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match split_key::<3>(s) {
            Some([bus, rule, target]) => Ok(Self::new(bus, rule, target)),
            None => Err(KeyParseError {
                key: s.to_owned(),
                kind: "target",
                expected: "<bus>:<rule>:<target>",
            }),
        }
    }
}

/// Split `s` into exactly `N` non-empty parts.
fn split_key<const N: usize>(s: &str) -> Option<[&str; N]> {
    let mut parts = [""; N];
    let mut iter = s.split(KEY_SEPARATOR);
    for slot in &mut parts {
        let part = iter.next()?;
        if part.is_empty() {
            return None;
        }
        *slot = part;
    }
    iter.next().is_none().then_some(parts)
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(RuleKey);
string_serde!(TargetKey);
