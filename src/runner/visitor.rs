//! Callbacks the coordinator reports through.

use specula_core::{ExpectationFailed, SpecType};

use super::RunSummary;
use super::discovery::{Behavior, DiscoveryError, Scenario};
use super::outcome::{ExecutionError, Outcome};

/// Receives the structure and results of a run, in execution order.
///
/// For every behavior that runs, exactly one of `on_behavior_passed`, `on_behavior_mismatch`, or
/// `on_behavior_error` is called, after the behavior's teardown has finished.
pub trait SpecVisitor {
    fn on_specification_start(&mut self, _spec: &SpecType) {}

    fn on_specification_end(&mut self, _spec: &SpecType, _summary: &RunSummary) {}

    fn on_scenario_start(&mut self, scenario: &Scenario);

    fn on_scenario_end(&mut self, scenario: &Scenario);

    /// A behavior is about to run, or is being listed in a dry run.
    fn on_behavior(&mut self, _behavior: &Behavior) {}

    fn on_behavior_passed(&mut self, behavior: &Behavior);

    fn on_behavior_mismatch(&mut self, behavior: &Behavior, detail: &ExpectationFailed);

    fn on_behavior_error(&mut self, behavior: &Behavior, cause: &ExecutionError);

    /// The specification could not be discovered and was not run.
    fn on_discovery_error(&mut self, _spec: &SpecType, _error: &DiscoveryError) {}

    /// Every requested specification has finished.
    fn on_run_complete(&mut self, _summary: &RunSummary) {}
}

/// Dispatch an outcome to the matching callback.
pub fn report_outcome(visitor: &mut dyn SpecVisitor, behavior: &Behavior, outcome: &Outcome) {
    match outcome {
        Outcome::Passed => visitor.on_behavior_passed(behavior),
        Outcome::Mismatch(detail) => visitor.on_behavior_mismatch(behavior, detail),
        Outcome::Error(cause) => visitor.on_behavior_error(behavior, cause),
    }
}
