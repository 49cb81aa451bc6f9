//! JSON lines reporter: one object per event.

use std::io::{self, Write};

use miette::Diagnostic;
use serde_json::{Value, json};
use specula_core::{ExpectationFailed, SpecType};

use super::Output;
use crate::runner::{Behavior, DiscoveryError, ExecutionError, RunSummary, Scenario, SpecVisitor};

pub struct JsonReporter<W: Write> {
    output: Output<W>,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            output: Output::new(out),
        }
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.output.into_inner()
    }

    fn emit(&mut self, event: Value) {
        self.output.line(format_args!("{event}"));
    }
}

fn summary_fields(summary: &RunSummary) -> Value {
    json!({
        "passed": summary.passed,
        "mismatched": summary.mismatched,
        "errored": summary.errored,
        "visited": summary.visited,
        "discovery_errors": summary.discovery_errors,
        "duration_ms": summary.duration.as_secs_f64() * 1000.0,
    })
}

impl<W: Write> SpecVisitor for JsonReporter<W> {
    fn on_specification_start(&mut self, spec: &SpecType) {
        self.emit(json!({ "event": "spec_start", "spec": spec.name }));
    }

    fn on_specification_end(&mut self, spec: &SpecType, summary: &RunSummary) {
        self.emit(json!({ "event": "spec_end", "spec": spec.name, "summary": summary_fields(summary) }));
    }

    fn on_scenario_start(&mut self, scenario: &Scenario) {
        self.emit(json!({
            "event": "scenario_start",
            "scenario": scenario.qualified_name(),
            "sentence": scenario.sentence(),
            "depth": scenario.depth(),
        }));
    }

    fn on_scenario_end(&mut self, scenario: &Scenario) {
        self.emit(json!({ "event": "scenario_end", "scenario": scenario.qualified_name() }));
    }

    fn on_behavior(&mut self, behavior: &Behavior) {
        self.emit(json!({
            "event": "behavior",
            "behavior": behavior.qualified_name(),
            "sentence": behavior.sentence(),
        }));
    }

    fn on_behavior_passed(&mut self, behavior: &Behavior) {
        self.emit(json!({ "event": "passed", "behavior": behavior.qualified_name() }));
    }

    fn on_behavior_mismatch(&mut self, behavior: &Behavior, detail: &ExpectationFailed) {
        self.emit(json!({
            "event": "mismatch",
            "behavior": behavior.qualified_name(),
            "message": detail.message(),
            "location": detail.location(),
        }));
    }

    fn on_behavior_error(&mut self, behavior: &Behavior, cause: &ExecutionError) {
        self.emit(json!({
            "event": "error",
            "behavior": behavior.qualified_name(),
            "message": cause.to_string(),
            "teardown": cause.is_teardown(),
        }));
    }

    fn on_discovery_error(&mut self, spec: &SpecType, error: &DiscoveryError) {
        self.emit(json!({
            "event": "discovery_error",
            "spec": spec.name,
            "code": error.code().map(|code| code.to_string()),
            "message": error.to_string(),
        }));
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        self.emit(json!({ "event": "summary", "summary": summary_fields(summary) }));
        self.output.flush();
    }
}
