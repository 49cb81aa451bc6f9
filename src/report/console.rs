//! Console reporter (pytest-style)
//!
//! Compact mode prints one character per behavior (`.` passed, `F` mismatch, `E` error) on a line per
//! specification. Verbose mode prints the scenario tree with a status per behavior. Both end with a
//! FAILURES section and a summary line.

use std::io::{self, Write};

use specula_core::{ExpectationFailed, SpecType};

use super::Output;
use crate::runner::{Behavior, DiscoveryError, ExecutionError, RunSummary, Scenario, SpecVisitor};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    Mismatch,
    Error,
}

#[derive(Debug)]
struct FailureRecord {
    behavior: String,
    kind: FailureKind,
    message: String,
    location: Option<String>,
    causes: Vec<String>,
}

/// Default console reporter (pytest-style)
pub struct ConsoleReporter<W: Write> {
    output: Output<W>,
    verbose: bool,
    color: bool,
    behavior_depth: usize,
    failures: Vec<FailureRecord>,
}

impl<W: Write> ConsoleReporter<W> {
    /// Report to `out`, without colors.
    pub fn new(out: W, verbose: bool) -> Self {
        Self {
            output: Output::new(out),
            verbose,
            color: false,
            behavior_depth: 1,
            failures: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Finish reporting, returning the writer or the first write error.
    pub fn into_inner(self) -> io::Result<W> {
        self.output.into_inner()
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.color {
            format!("{style}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn status(&mut self, behavior: &Behavior, style: &str, verbose: &str, compact: &str) {
        if self.verbose {
            let indent = indent(self.behavior_depth);
            let status = self.paint(style, verbose);
            self.output
                .line(format_args!("{indent}{} {status}", behavior.sentence()));
        } else {
            let mark = self.paint(style, compact);
            self.output.write(format_args!("{mark}"));
        }
    }

    fn write_failures(&mut self) {
        if self.failures.is_empty() {
            return;
        }
        let header = self.paint(RED, "FAILURES");
        self.output.line(format_args!(""));
        self.output
            .line(format_args!("=================== {header} ==================="));
        let failures = std::mem::take(&mut self.failures);
        for failure in &failures {
            let title = self.paint(RED, &failure.behavior);
            self.output.line(format_args!("_____ {title} _____"));
            match failure.kind {
                FailureKind::Mismatch => self.output.line(format_args!("{}", failure.message)),
                FailureKind::Error => self.output.line(format_args!("error: {}", failure.message)),
            }
            for cause in &failure.causes {
                self.output.line(format_args!("  caused by: {cause}"));
            }
            if let Some(location) = &failure.location {
                self.output.line(format_args!("  at {location}"));
            }
        }
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

/// `====== 3 passed, 1 mismatched in 0.01s ======`
pub fn summary_line(summary: &RunSummary, color: bool) -> String {
    let paint = |style: &str, text: String| {
        if color { format!("{style}{text}{RESET}") } else { text }
    };
    let mut parts = Vec::new();
    if summary.passed > 0 {
        parts.push(paint(GREEN, format!("{} passed", summary.passed)));
    }
    if summary.mismatched > 0 {
        parts.push(paint(RED, format!("{} mismatched", summary.mismatched)));
    }
    if summary.errored > 0 {
        parts.push(paint(RED, format!("{} errored", summary.errored)));
    }
    if summary.discovery_errors > 0 {
        let noun = if summary.discovery_errors == 1 { "error" } else { "errors" };
        parts.push(paint(RED, format!("{} discovery {noun}", summary.discovery_errors)));
    }
    if parts.is_empty() {
        let visited = summary.visited;
        parts.push(paint(
            YELLOW,
            if visited > 0 {
                format!("{visited} listed")
            } else {
                "no behaviors ran".to_string()
            },
        ));
    }
    format!(
        "====== {} in {:.2}s ======",
        parts.join(", "),
        summary.duration.as_secs_f64()
    )
}

impl<W: Write> SpecVisitor for ConsoleReporter<W> {
    fn on_specification_start(&mut self, spec: &SpecType) {
        let name = self.paint(BOLD, spec.name);
        if self.verbose {
            self.output.line(format_args!("{name}"));
        } else {
            self.output.write(format_args!("{name} "));
        }
    }

    fn on_specification_end(&mut self, _spec: &SpecType, _summary: &RunSummary) {
        if !self.verbose {
            self.output.line(format_args!(""));
        }
    }

    fn on_scenario_start(&mut self, scenario: &Scenario) {
        self.behavior_depth = scenario.depth() + 2;
        if self.verbose {
            let indent = indent(scenario.depth() + 1);
            self.output.line(format_args!("{indent}{}", scenario.sentence()));
        }
    }

    fn on_scenario_end(&mut self, scenario: &Scenario) {
        self.behavior_depth = scenario.depth() + 1;
    }

    fn on_behavior_passed(&mut self, behavior: &Behavior) {
        self.status(behavior, GREEN, "PASSED", ".");
    }

    fn on_behavior_mismatch(&mut self, behavior: &Behavior, detail: &ExpectationFailed) {
        self.status(behavior, RED, "MISMATCH", "F");
        self.failures.push(FailureRecord {
            behavior: behavior.qualified_name(),
            kind: FailureKind::Mismatch,
            message: detail.message().to_string(),
            location: detail.location().map(str::to_string),
            causes: Vec::new(),
        });
    }

    fn on_behavior_error(&mut self, behavior: &Behavior, cause: &ExecutionError) {
        self.status(behavior, RED, "ERROR", "E");
        let mut causes = Vec::new();
        let mut source = cause.cause().and_then(|c| c.as_error().source());
        while let Some(err) = source {
            causes.push(err.to_string());
            source = err.source();
        }
        self.failures.push(FailureRecord {
            behavior: behavior.qualified_name(),
            kind: FailureKind::Error,
            message: cause.to_string(),
            location: None,
            causes,
        });
    }

    fn on_discovery_error(&mut self, spec: &SpecType, error: &DiscoveryError) {
        let title = self.paint(RED, "discovery failed");
        self.output.line(format_args!("{}: {title}", spec.name));
        let report = miette::Report::new(error.clone());
        self.output.line(format_args!("{report:?}"));
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        self.write_failures();
        self.output.line(format_args!(""));
        let line = summary_line(summary, self.color);
        self.output.line(format_args!("{line}"));
        self.output.flush();
    }
}
