//! Merging user objects over synthesized defaults.
//!
//! The precedence is explicit: on a key present on both sides the user
//! object replaces the default whole. Fields are never blended, so a merged
//! object is always exactly one of its inputs. Merging is total.

use std::collections::BTreeMap;

use rustack_events_model::alarm::{AlarmSpec, AnomalyAlarmSpec, DeadLetterAlarmSpec};
use rustack_events_model::types::Origin;
use tracing::debug;

use crate::model::ValidatedSpec;
use crate::synthesize::Synthesized;

/// A merged object together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub origin: Origin,
    pub value: T,
}

/// Merge `overrides` over `defaults`.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use rustack_events_core::merge::merge;
/// use rustack_events_model::types::Origin;
///
/// let defaults = BTreeMap::from([("a".to_owned(), 1), ("b".to_owned(), 2)]);
/// let overrides = BTreeMap::from([("b".to_owned(), 20), ("c".to_owned(), 30)]);
///
/// let merged = merge(defaults, overrides);
/// assert_eq!(merged["a"].origin, Origin::Synthesized);
/// assert_eq!(merged["b"].value, 20);
/// assert_eq!(merged["b"].origin, Origin::Overridden);
/// assert_eq!(merged["c"].origin, Origin::User);
/// ```
#[must_use]
pub fn merge<T>(
    defaults: BTreeMap<String, T>,
    overrides: BTreeMap<String, T>,
) -> BTreeMap<String, Sourced<T>> {
    let mut merged: BTreeMap<String, Sourced<T>> = defaults
        .into_iter()
        .map(|(key, value)| {
            (key, Sourced {
                origin: Origin::Synthesized,
                value,
            })
        })
        .collect();

    for (key, value) in overrides {
        let origin = if merged.contains_key(&key) {
            Origin::Overridden
        } else {
            Origin::User
        };
        merged.insert(key, Sourced { origin, value });
    }
    merged
}

/// Every alarm kind after merging.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedAlarms {
    pub alarms: BTreeMap<String, Sourced<AlarmSpec>>,
    pub anomaly_alarms: BTreeMap<String, Sourced<AnomalyAlarmSpec>>,
    pub dead_letter_alarms: BTreeMap<String, Sourced<DeadLetterAlarmSpec>>,
}

/// Merge the user's alarms over the synthesized ones, kind by kind.
#[must_use]
pub fn merge_alarms(synthesized: &Synthesized, spec: &ValidatedSpec) -> MergedAlarms {
    let merged = MergedAlarms {
        alarms: merge(synthesized.alarms.clone(), spec.alarms.clone()),
        // nothing synthesizes anomaly alarms
        anomaly_alarms: merge(BTreeMap::new(), spec.anomaly_alarms.clone()),
        dead_letter_alarms: merge(
            synthesized.dead_letter_alarms.clone(),
            spec.dead_letter_alarms.clone(),
        ),
    };

    debug!(
        alarms = merged.alarms.len(),
        anomaly_alarms = merged.anomaly_alarms.len(),
        dead_letter_alarms = merged.dead_letter_alarms.len(),
        "merged alarms over synthesized defaults"
    );
    merged
}
