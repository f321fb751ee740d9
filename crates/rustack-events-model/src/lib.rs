//! EventBridge routing model types for Rustack.
//!
//! This crate holds the vocabulary shared by the routing compiler and its
//! consumers: the user-authored [`EventRoutingSpec`], the typed values the
//! validator produces, composite keys, structured [`Diagnostics`], and the
//! [`CompiledOutput`] handed to the provisioner.
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::module_name_repetitions)]
#![allow(missing_docs)]

pub mod alarm;
pub mod diagnostic;
pub mod keys;
pub mod output;
pub mod spec;
pub mod toggles;
pub mod types;

pub use alarm::{AlarmSpec, AnomalyAlarmSpec, DeadLetterAlarmSpec};
pub use diagnostic::{Diagnostic, DiagnosticCategory, Diagnostics};
pub use keys::{DEFAULT_BUS, KEY_SEPARATOR, RuleKey, TargetKey};
pub use output::CompiledOutput;
pub use spec::EventRoutingSpec;
pub use toggles::ObservabilityToggles;
