//! Error types for the routing compiler.

use rustack_core::RustStackError;
use rustack_events_model::Diagnostics;

/// Error returned when a compilation does not produce an output graph.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// At least one stage reported a diagnostic.
    #[error("specification rejected with {} diagnostic(s)", diagnostics.len())]
    Rejected {
        /// Every diagnostic reported, in stage order.
        diagnostics: Diagnostics,
    },

    /// The compiler configuration is unusable.
    #[error(transparent)]
    Config(#[from] RustStackError),
}

impl CompileError {
    /// The diagnostics of a rejected compilation.
    #[must_use]
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Self::Rejected { diagnostics } => Some(diagnostics),
            Self::Config(_) => None,
        }
    }
}
