//! End-to-end tests of the EventBridge routing compiler.
//!
//! Every test drives the public API the way the CLI does: a JSON document is
//! deserialized into an [`EventRoutingSpec`], compiled, and the resulting
//! graph or diagnostics are inspected.
//!
//! ```text
//! cargo test -p rustack-integration
//! ```

use std::sync::Once;

use rustack_core::AccountId;
use rustack_events_core::{Compilation, CompilerConfig, RoutingCompiler};
use rustack_events_model::{CompiledOutput, Diagnostics, EventRoutingSpec};

static INIT: Once = Once::new();

/// Account every fixture is written for.
pub const ACCOUNT_ID: &str = "123456789012";

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A compiler for the fixture account in `us-east-1`.
#[must_use]
pub fn compiler() -> RoutingCompiler {
    init_tracing();
    let config = CompilerConfig::builder()
        .account_id(AccountId::new(ACCOUNT_ID).unwrap_or_else(|e| panic!("{e}")))
        .build();
    RoutingCompiler::new(config)
}

/// Raw JSON of a fixture under `fixtures/`.
#[must_use]
pub fn fixture_json(name: &str) -> &'static str {
    match name {
        "two_buses" => include_str!("../fixtures/two_buses.json"),
        "full" => include_str!("../fixtures/full.json"),
        other => panic!("unknown fixture {other}"),
    }
}

/// A fixture parsed as a routing specification.
#[must_use]
pub fn load_spec(name: &str) -> EventRoutingSpec {
    parse_spec(fixture_json(name))
}

/// Parse a routing specification, panicking on malformed JSON.
#[must_use]
pub fn parse_spec(json: &str) -> EventRoutingSpec {
    serde_json::from_str(json).unwrap_or_else(|e| panic!("invalid specification JSON: {e}"))
}

/// Compile `spec` and expect it to resolve.
#[must_use]
pub fn compile_ok(spec: &EventRoutingSpec) -> CompiledOutput {
    match compiler().compile(spec) {
        Compilation::Resolved(output) => *output,
        Compilation::Rejected(diagnostics) => {
            panic!("expected the specification to compile, got {diagnostics:#?}")
        }
    }
}

/// Compile `spec` and expect it to be rejected.
#[must_use]
pub fn compile_rejected(spec: &EventRoutingSpec) -> Diagnostics {
    match compiler().compile(spec) {
        Compilation::Resolved(output) => {
            panic!("expected the specification to be rejected, got {output:#?}")
        }
        Compilation::Rejected(diagnostics) => diagnostics,
    }
}

mod test_determinism;
mod test_full;
mod test_rejection;
mod test_scenarios;
