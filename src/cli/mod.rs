//! Command-line front end.
//!
//! A specification binary, or a `harness = false` test target, hands its specifications to [`run`]:
//!
//! ```ignore
//! fn main() {
//!     specula::cli::run(&[stack_spec::specification(), queue_spec::specification()]);
//! }
//! ```
//!
//! ## Flags
//!
//! - `-k EXPR` - only behaviors whose `Spec::Scenario::behavior` name contains EXPR
//! - `-v` / `--verbose` - one line per behavior
//! - `-x` / `--exitfirst` - stop at the first behavior that does not pass
//! - `--list` - print the scenario tree without running anything
//! - `--format console|json`, `--order declared|name`, `--no-color`
//!
//! ## Design
//!
//! Functions return `CliResult<T>` instead of calling `process::exit`. Only [`run`] exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::process;

use clap::{Parser, ValueEnum};
use specula_core::SpecType;

use crate::config::RunnerConfig;
use crate::report::{ConsoleReporter, JsonReporter, OutlineReporter};
use crate::runner::{DeclarationOrder, NameOrder, RunSummary, SpecRunner};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. [`run`] prints the message and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Run behavior specifications
#[derive(Parser, Debug, Clone)]
#[command(name = "specula")]
#[command(version = VERSION)]
#[command(about = "Run behavior specifications", long_about = None)]
pub struct Cli {
    /// Only run behaviors whose qualified name (Spec::Scenario::behavior) contains EXPR
    #[arg(short = 'k', value_name = "EXPR")]
    pub filter: Option<String>,

    /// Print every behavior with its status
    #[arg(short, long)]
    pub verbose: bool,

    /// Stop after the first behavior that does not pass
    #[arg(short = 'x', long = "exitfirst")]
    pub exit_first: bool,

    /// List scenarios and behaviors without running them
    #[arg(long)]
    pub list: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    pub format: ReportFormat,

    /// Order of scenarios and behaviors
    #[arg(long, value_enum, default_value_t = OrderArg::Declared)]
    pub order: OrderArg,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    /// Source declaration order
    Declared,
    /// Alphabetical
    Name,
}

impl Cli {
    /// The runner configuration these flags ask for.
    pub fn config(&self) -> RunnerConfig {
        let config = RunnerConfig::new().with_fail_fast(self.exit_first);
        let config = match self.order {
            OrderArg::Declared => config.with_ordering(DeclarationOrder),
            OrderArg::Name => config.with_ordering(NameOrder),
        };
        match &self.filter {
            Some(filter) => config.with_filter(filter.clone()),
            None => config,
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Parse the command line, run `specs`, and exit with 0 when everything passed.
pub fn run(specs: &[SpecType]) -> ! {
    init_tracing();
    let cli = Cli::parse();
    let stdout = io::stdout();
    let color = !cli.no_color && stdout.is_terminal();

    match execute(&cli, specs, stdout.lock(), color) {
        Ok(exit_code) => process::exit(exit_code.0),
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("error: {}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Structured logging to stderr, filtered by `RUST_LOG` (default `warn`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();
}

/// Run or list `specs` as `cli` asks, reporting to `out`.
#[tracing::instrument(skip_all, fields(specs = specs.len(), list = cli.list))]
pub fn execute<W: Write>(cli: &Cli, specs: &[SpecType], out: W, color: bool) -> CliResult<ExitCode> {
    if specs.is_empty() {
        return Err(CliError::failure("no specifications to run"));
    }
    let runner = SpecRunner::new(cli.config());

    let summary = match (cli.list, cli.format) {
        (true, ReportFormat::Console) => {
            let mut reporter = OutlineReporter::new(out);
            let summary = runner.visit_all(specs, &mut reporter);
            finish(reporter.into_inner(), summary)?
        }
        (true, ReportFormat::Json) => {
            let mut reporter = JsonReporter::new(out);
            let summary = runner.visit_all(specs, &mut reporter);
            finish(reporter.into_inner(), summary)?
        }
        (false, ReportFormat::Console) => {
            let mut reporter = ConsoleReporter::new(out, cli.verbose).with_color(color);
            let summary = runner.run_all(specs, &mut reporter);
            finish(reporter.into_inner(), summary)?
        }
        (false, ReportFormat::Json) => {
            let mut reporter = JsonReporter::new(out);
            let summary = runner.run_all(specs, &mut reporter);
            finish(reporter.into_inner(), summary)?
        }
    };

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn finish<W>(written: io::Result<W>, summary: RunSummary) -> CliResult<RunSummary> {
    written.map_err(|err| CliError::failure(format!("failed to write report: {err}")))?;
    Ok(summary)
}
