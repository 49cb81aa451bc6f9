//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::sync::{Mutex, PoisonError};

use specula::runner::{Behavior, DiscoveryError, ExecutionError, Scenario};
use specula::{ExpectationFailed, RunSummary, SpecType, SpecVisitor};

/// Ordered event log for one specification. Each specification gets its own static journal so tests
/// running in parallel never share one.
pub struct Journal(Mutex<Vec<String>>);

impl Journal {
    pub const fn new() -> Self {
        Self(Mutex::new(Vec::new()))
    }

    pub fn record(&self, event: impl Into<String>) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(event.into());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn count(&self, event: &str) -> usize {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| *e == event)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub behavior: String,
    pub message: String,
    pub teardown: bool,
    pub panicked: bool,
    /// `Debug` of the original cause, when specification code raised one.
    pub cause: Option<String>,
}

/// Visitor that records every callback as a line.
#[derive(Default)]
pub struct Recorder {
    pub events: Vec<String>,
    pub errors: Vec<ErrorRecord>,
    pub summaries: Vec<RunSummary>,
}

impl Recorder {
    /// Only the outcome lines (`passed`, `mismatch`, `error`).
    pub fn outcomes(&self) -> Vec<&str> {
        self.events
            .iter()
            .map(String::as_str)
            .filter(|e| e.starts_with("passed ") || e.starts_with("mismatch ") || e.starts_with("error "))
            .collect()
    }
}

impl SpecVisitor for Recorder {
    fn on_specification_start(&mut self, spec: &SpecType) {
        self.events.push(format!("spec {}", spec.name));
    }

    fn on_specification_end(&mut self, spec: &SpecType, _summary: &RunSummary) {
        self.events.push(format!("end spec {}", spec.name));
    }

    fn on_scenario_start(&mut self, scenario: &Scenario) {
        self.events.push(format!("scenario {}", scenario.qualified_name()));
    }

    fn on_scenario_end(&mut self, scenario: &Scenario) {
        self.events.push(format!("end scenario {}", scenario.qualified_name()));
    }

    fn on_behavior(&mut self, behavior: &Behavior) {
        self.events.push(format!("behavior {}", behavior.qualified_name()));
    }

    fn on_behavior_passed(&mut self, behavior: &Behavior) {
        self.events.push(format!("passed {}", behavior.qualified_name()));
    }

    fn on_behavior_mismatch(&mut self, behavior: &Behavior, detail: &ExpectationFailed) {
        self.events
            .push(format!("mismatch {}: {}", behavior.qualified_name(), detail.message()));
    }

    fn on_behavior_error(&mut self, behavior: &Behavior, cause: &ExecutionError) {
        self.events.push(format!("error {}: {cause}", behavior.qualified_name()));
        self.errors.push(ErrorRecord {
            behavior: behavior.qualified_name(),
            message: cause.to_string(),
            teardown: cause.is_teardown(),
            panicked: matches!(cause, ExecutionError::Panicked { .. }),
            cause: cause.cause().map(|c| format!("{c:?}")),
        });
    }

    fn on_discovery_error(&mut self, spec: &SpecType, error: &DiscoveryError) {
        self.events.push(format!("discovery error {}: {error}", spec.name));
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        self.events.push("complete".to_string());
        self.summaries.push(summary.clone());
    }
}
