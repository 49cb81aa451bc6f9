//! Sentence outline of a specification.
//!
//! ```text
//! Stack spec
//!   Empty stack
//!     - is empty
//!     - pop fails
//! ```
//!
//! In a real run each behavior line also carries its outcome.

use std::io::{self, Write};

use specula_core::{ExpectationFailed, SpecType, sentence};

use super::Output;
use crate::runner::{Behavior, DiscoveryError, ExecutionError, Scenario, SpecVisitor};

pub struct OutlineReporter<W: Write> {
    output: Output<W>,
    behavior_depth: usize,
    pending: Option<String>,
}

impl<W: Write> OutlineReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            output: Output::new(out),
            behavior_depth: 1,
            pending: None,
        }
    }

    pub fn into_inner(mut self) -> io::Result<W> {
        self.flush_pending();
        self.output.into_inner()
    }

    fn flush_pending(&mut self) {
        if let Some(line) = self.pending.take() {
            self.output.line(format_args!("{line}"));
        }
    }

    fn finish_behavior(&mut self, status: &str) {
        if let Some(line) = self.pending.take() {
            self.output.line(format_args!("{line} [{status}]"));
        }
    }
}

impl<W: Write> SpecVisitor for OutlineReporter<W> {
    fn on_specification_start(&mut self, spec: &SpecType) {
        self.flush_pending();
        self.output.line(format_args!("{}", sentence::from_identifier(spec.name)));
    }

    fn on_scenario_start(&mut self, scenario: &Scenario) {
        self.flush_pending();
        self.behavior_depth = scenario.depth() + 2;
        let indent = "  ".repeat(scenario.depth() + 1);
        self.output.line(format_args!("{indent}{}", scenario.sentence()));
    }

    fn on_scenario_end(&mut self, scenario: &Scenario) {
        self.flush_pending();
        self.behavior_depth = scenario.depth() + 1;
    }

    fn on_behavior(&mut self, behavior: &Behavior) {
        self.flush_pending();
        let indent = "  ".repeat(self.behavior_depth);
        self.pending = Some(format!("{indent}- {}", behavior.sentence()));
    }

    fn on_behavior_passed(&mut self, _behavior: &Behavior) {
        self.finish_behavior("passed");
    }

    fn on_behavior_mismatch(&mut self, _behavior: &Behavior, _detail: &ExpectationFailed) {
        self.finish_behavior("mismatch");
    }

    fn on_behavior_error(&mut self, _behavior: &Behavior, _cause: &ExecutionError) {
        self.finish_behavior("error");
    }

    fn on_discovery_error(&mut self, spec: &SpecType, error: &DiscoveryError) {
        self.flush_pending();
        self.output.line(format_args!("{}: {error}", sentence::from_identifier(spec.name)));
    }
}
