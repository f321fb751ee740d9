//! The compilation pipeline.
//!
//! ```text
//! EventRoutingSpec
//!        |
//!        v
//!   validate ──── diagnostics ──> Rejected
//!        |
//!        v
//!   flatten -> synthesize -> merge -> crossref -> resolve
//!        |                                 └── diagnostics ──> Rejected
//!        v
//!   dashboard -> project ──> Resolved(CompiledOutput)
//! ```
//!
//! The validator is a gate. The later checking stages each collect their
//! diagnostics and the compilation is rejected if any exist once all of them
//! ran; no partial output is ever produced.

use rustack_events_model::{CompiledOutput, Diagnostics, EventRoutingSpec};
use tracing::{debug, info, warn};

use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::model::ValidatedSpec;
use crate::{crossref, dashboard, flatten, merge, project, resolve, synthesize, validation};

/// Terminal state of one compilation.
#[derive(Debug, Clone, PartialEq)]
pub enum Compilation {
    /// Every stage succeeded.
    Resolved(Box<CompiledOutput>),
    /// At least one stage reported a diagnostic.
    Rejected(Diagnostics),
}

impl Compilation {
    /// Whether the specification compiled.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// The output of a resolved compilation.
    #[must_use]
    pub fn output(&self) -> Option<&CompiledOutput> {
        match self {
            Self::Resolved(output) => Some(output),
            Self::Rejected(_) => None,
        }
    }

    /// The diagnostics of a rejected compilation.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::Resolved(_) => None,
            Self::Rejected(diagnostics) => Some(diagnostics),
        }
    }

    /// Convert into a `Result`.
    pub fn into_result(self) -> Result<CompiledOutput, CompileError> {
        match self {
            Self::Resolved(output) => Ok(*output),
            Self::Rejected(diagnostics) => Err(CompileError::Rejected { diagnostics }),
        }
    }
}

/// Compiles routing specifications for one account and region.
#[derive(Debug, Clone, Default)]
pub struct RoutingCompiler {
    /// Account, region, and naming settings.
    pub config: CompilerConfig,
}

impl RoutingCompiler {
    /// Create a compiler.
    #[must_use]
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Create a compiler configured from the environment.
    pub fn from_env() -> Result<Self, CompileError> {
        Ok(Self::new(CompilerConfig::from_env()?))
    }

    /// Run the structural and semantic checks only.
    pub fn validate(&self, spec: &EventRoutingSpec) -> Result<ValidatedSpec, Diagnostics> {
        validation::validate(spec).inspect_err(|diagnostics| {
            warn!(
                diagnostics = diagnostics.len(),
                "specification failed validation"
            );
        })
    }

    /// Compile a specification into its resolved resource graph.
    #[must_use]
    pub fn compile(&self, spec: &EventRoutingSpec) -> Compilation {
        let validated = match self.validate(spec) {
            Ok(validated) => validated,
            Err(diagnostics) => return Compilation::Rejected(diagnostics),
        };
        let toggles = &validated.observability;

        let flat = flatten::flatten(&validated, &self.config);
        let synthesized = synthesize::synthesize(&flat, toggles, &self.config);
        let merged = merge::merge_alarms(&synthesized, &validated);

        let mut diagnostics = crossref::check(&validated, &flat, &merged, &synthesized, &self.config);
        let (alarms, unresolved) = resolve::resolve(&merged, &flat, &self.config);
        diagnostics.extend(unresolved);

        if !diagnostics.is_empty() {
            warn!(
                diagnostics = diagnostics.len(),
                "specification rejected"
            );
            for diagnostic in diagnostics.iter() {
                debug!(%diagnostic, "diagnostic");
            }
            return Compilation::Rejected(diagnostics);
        }

        let dashboard = dashboard::generate(&flat, &alarms, toggles, &self.config);
        let output = project::project(flat, synthesized, alarms, dashboard);

        info!(
            buses = output.buses.len(),
            rules = output.rules.len(),
            targets = output.targets.len(),
            alarms = output.summary.total_alarms,
            dashboard = output.dashboard.is_some(),
            "specification compiled"
        );
        Compilation::Resolved(Box::new(output))
    }
}

/// Compile `spec` with `config`.
///
/// # Examples
///
/// ```
/// use rustack_events_core::{CompilerConfig, compile};
/// use rustack_events_model::EventRoutingSpec;
///
/// let spec: EventRoutingSpec = serde_json::from_str(r#"{
///     "buses": [{
///         "name": "orders",
///         "rules": [{
///             "name": "created",
///             "event_pattern": "{\"source\": [\"shop\"]}",
///             "targets": [{"id": "queue", "arn": "arn:aws:sqs:us-east-1:000000000000:orders"}]
///         }]
///     }]
/// }"#).unwrap();
///
/// let output = compile(&spec, &CompilerConfig::default()).into_result().unwrap();
/// assert!(output.rules.contains_key(&"orders:created".parse().unwrap()));
/// ```
#[must_use]
pub fn compile(spec: &EventRoutingSpec, config: &CompilerConfig) -> Compilation {
    RoutingCompiler::new(config.clone()).compile(spec)
}
