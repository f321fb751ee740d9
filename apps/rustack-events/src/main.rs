//! Rustack Events - EventBridge routing configuration compiler.
//!
//! Reads a routing specification (JSON), compiles it, and writes either the
//! resolved resource graph or the list of diagnostics as JSON.
//!
//! # Usage
//!
//! ```text
//! rustack-events compile --spec routing.json --output resolved.json
//! rustack-events validate --spec routing.json
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DEFAULT_REGION` | `us-east-1` | Region of generated ARNs |
//! | `ACCOUNT_ID` | `000000000000` | Account of generated ARNs |
//! | `PARTITION` | `aws` | Partition of generated ARNs |
//! | `DASHBOARD_PREFIX` | `eventbridge` | Prefix of the dashboard name |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//!
//! Exit status is 0 on success, 2 when the specification is rejected, and 1
//! on any other error.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rustack_core::{AccountId, AwsRegion};
use rustack_events_core::{Compilation, CompilerConfig, RoutingCompiler};
use rustack_events_model::{Diagnostics, EventRoutingSpec};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit status of a rejected specification.
const EXIT_REJECTED: u8 = 2;

/// Compile EventBridge routing specifications.
#[derive(Debug, Parser)]
#[command(name = "rustack-events", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Region of generated ARNs (overrides `DEFAULT_REGION`).
    #[arg(long, global = true)]
    region: Option<String>,

    /// Account of generated ARNs (overrides `ACCOUNT_ID`).
    #[arg(long, global = true)]
    account_id: Option<String>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile a specification into its resolved resource graph.
    Compile {
        #[command(flatten)]
        input: Input,

        /// Write the output here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Emit compact instead of pretty-printed JSON.
        #[arg(long)]
        compact: bool,
    },
    /// Check a specification without producing output.
    Validate {
        #[command(flatten)]
        input: Input,
    },
}

#[derive(Debug, Args)]
struct Input {
    /// Path to the routing specification (JSON).
    #[arg(long, short)]
    spec: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Initialize the tracing subscriber on stderr.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str, format: LogFormat) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<CompilerConfig> {
    let mut config = CompilerConfig::from_env().context("invalid compiler configuration")?;
    if let Some(region) = &cli.region {
        config.region = AwsRegion::new(region);
    }
    if let Some(account_id) = &cli.account_id {
        config.account_id = AccountId::new(account_id).context("invalid --account-id")?;
    }
    Ok(config)
}

fn read_spec(path: &Path) -> Result<EventRoutingSpec> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read specification {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse specification {}", path.display()))
}

fn to_json<T: Serialize>(value: &T, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    json.context("failed to serialize output")
}

fn write_output(path: Option<&Path>, json: &str) -> Result<()> {
    match path {
        Some(path) => fs::write(path, format!("{json}\n"))
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("failed to write to stdout")
        }
    }
}

fn report_rejection(diagnostics: &Diagnostics) -> Result<ExitCode> {
    for diagnostic in diagnostics.iter() {
        error!(%diagnostic, "rejected");
    }
    write_output(None, &to_json(diagnostics, false)?)?;
    Ok(ExitCode::from(EXIT_REJECTED))
}

fn run(cli: &Cli, compiler: &RoutingCompiler) -> Result<ExitCode> {
    match &cli.command {
        Command::Compile {
            input,
            output,
            compact,
        } => {
            let spec = read_spec(&input.spec)?;
            match compiler.compile(&spec) {
                Compilation::Resolved(resolved) => {
                    write_output(output.as_deref(), &to_json(&resolved, *compact)?)?;
                    if let Some(path) = output {
                        info!(path = %path.display(), "wrote resolved graph");
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Compilation::Rejected(diagnostics) => report_rejection(&diagnostics),
            }
        }
        Command::Validate { input } => {
            let spec = read_spec(&input.spec)?;
            match compiler.compile(&spec) {
                Compilation::Resolved(_) => {
                    info!(spec = %input.spec.display(), "specification is valid");
                    Ok(ExitCode::SUCCESS)
                }
                Compilation::Rejected(diagnostics) => report_rejection(&diagnostics),
            }
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.log_level, cli.log_format)?;

    info!(
        region = %config.region,
        account_id = %config.account_id,
        "starting rustack-events"
    );
    run(&cli, &RoutingCompiler::new(config))
}
