//! EventBridge routing configuration compiler for Rustack.
//!
//! Turns a nested [`EventRoutingSpec`](rustack_events_model::EventRoutingSpec)
//! of buses, rules, targets, alarms, and observability toggles into a flat,
//! fully resolved resource graph, or into the complete list of diagnostics
//! explaining why it cannot. Compilation is pure: no I/O, no clock, and the
//! same input always yields byte-identical output.
//!
//! # Stages
//!
//! | Module | Stage |
//! |--------|-------|
//! | [`validation`] | structural and semantic checks |
//! | [`flatten`] | bus / rule / target tree to composite-keyed maps |
//! | [`synthesize`] | default alarms, log routes, Lambda permissions |
//! | [`merge`] | user objects over synthesized defaults |
//! | [`crossref`] | references between keyed collections |
//! | [`resolve`] | alarm fields through fallback chains |
//! | [`dashboard`] | dashboard derived from the resolved model |
//! | [`project`] | output maps and summary |
#![allow(missing_docs, clippy::module_name_repetitions)]

pub mod compiler;
pub mod config;
pub mod crossref;
pub mod dashboard;
pub mod error;
pub mod flatten;
pub mod merge;
pub mod model;
pub mod naming;
pub mod project;
pub mod resolve;
pub mod synthesize;
pub mod validation;

pub use compiler::{Compilation, RoutingCompiler, compile};
pub use config::CompilerConfig;
pub use error::CompileError;
