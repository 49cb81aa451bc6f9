//! The run coordinator.
//!
//! [`SpecRunner`] discovers a specification's scenario tree, brackets the traversal with the once-before
//! and once-after hooks, and hands every behavior to a [`BehaviorExecutor`], reporting through a
//! [`SpecVisitor`]. In visit mode the executor is replaced by [`VisitingExecutor`] and the hooks are skipped,
//! which lists the structure without running anything.
//!
//! ## Modules
//!
//! - `discovery` - scenario and behavior discovery, `DiscoveryError`
//! - `ordering` - member ordering service
//! - `executor` - per-behavior lifecycle, invocation seam
//! - `isolation` - current-thread vs dedicated-thread execution
//! - `classify` - turning raised signals into outcomes
//! - `outcome` - `Outcome`, `ExecutionError`
//! - `visitor` - `SpecVisitor` callbacks

pub mod classify;
pub mod discovery;
pub mod executor;
pub mod isolation;
pub mod ordering;
pub mod outcome;
pub mod visitor;

use std::sync::Arc;
use std::time::{Duration, Instant};

use specula_core::{HookFn, ONCE_AFTER_NAME, ONCE_BEFORE_NAME, SpecType};

use crate::config::RunnerConfig;

pub use discovery::{Behavior, DiscoveryError, Scenario, discover};
pub use executor::{BehaviorExecutor, DirectInvoker, LifecycleExecutor, MethodInvoker, VisitingExecutor};
pub use isolation::Isolation;
pub use ordering::{DeclarationOrder, MemberOrdering, NameOrder, Ordered};
pub use outcome::{ExecutionError, Outcome};
pub use visitor::SpecVisitor;

use classify::guarded;
use visitor::report_outcome;

/// Counts for one specification, or for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub mismatched: usize,
    pub errored: usize,
    /// Behaviors announced through `on_behavior`, executed or not.
    pub visited: usize,
    pub discovery_errors: usize,
    pub duration: Duration,
}

impl RunSummary {
    /// Behaviors that did not pass.
    pub fn failed(&self) -> usize {
        self.mismatched + self.errored
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.discovery_errors == 0
    }

    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Passed => self.passed += 1,
            Outcome::Mismatch(_) => self.mismatched += 1,
            Outcome::Error(_) => self.errored += 1,
        }
    }

    fn absorb(&mut self, other: &RunSummary) {
        self.passed += other.passed;
        self.mismatched += other.mismatched;
        self.errored += other.errored;
        self.visited += other.visited;
        self.discovery_errors += other.discovery_errors;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Run,
    Visit,
}

/// Runs specifications.
#[derive(Clone)]
pub struct SpecRunner {
    config: RunnerConfig,
    executor: Arc<dyn BehaviorExecutor>,
}

impl Default for SpecRunner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

impl SpecRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            executor: Arc::new(LifecycleExecutor::default()),
        }
    }

    /// Replace the executor used in run mode.
    pub fn with_executor(mut self, executor: impl BehaviorExecutor + 'static) -> Self {
        self.executor = Arc::new(executor);
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run every behavior of `spec`.
    ///
    /// A discovery error is reported to the visitor and returned; nothing runs, not even the once hooks.
    pub fn run(&self, spec: &SpecType, visitor: &mut dyn SpecVisitor) -> Result<RunSummary, DiscoveryError> {
        let summary = self.traverse(spec, visitor, Mode::Run)?;
        visitor.on_run_complete(&summary);
        Ok(summary)
    }

    /// Announce the structure of `spec` without running anything.
    pub fn visit(&self, spec: &SpecType, visitor: &mut dyn SpecVisitor) -> Result<RunSummary, DiscoveryError> {
        let summary = self.traverse(spec, visitor, Mode::Visit)?;
        visitor.on_run_complete(&summary);
        Ok(summary)
    }

    /// Run several specifications. A discovery error in one does not stop the others.
    pub fn run_all(&self, specs: &[SpecType], visitor: &mut dyn SpecVisitor) -> RunSummary {
        self.traverse_all(specs, visitor, Mode::Run)
    }

    /// Visit several specifications.
    pub fn visit_all(&self, specs: &[SpecType], visitor: &mut dyn SpecVisitor) -> RunSummary {
        self.traverse_all(specs, visitor, Mode::Visit)
    }

    fn traverse_all(&self, specs: &[SpecType], visitor: &mut dyn SpecVisitor, mode: Mode) -> RunSummary {
        let started = Instant::now();
        let mut total = RunSummary::default();
        for spec in specs {
            match self.traverse(spec, visitor, mode) {
                Ok(summary) => total.absorb(&summary),
                Err(_) => total.discovery_errors += 1,
            }
            if self.config.fail_fast && !total.is_success() {
                break;
            }
        }
        total.duration = started.elapsed();
        visitor.on_run_complete(&total);
        total
    }

    #[tracing::instrument(skip_all, fields(spec = spec.name, mode = ?mode))]
    fn traverse(
        &self,
        spec: &SpecType,
        visitor: &mut dyn SpecVisitor,
        mode: Mode,
    ) -> Result<RunSummary, DiscoveryError> {
        let started = Instant::now();
        let scenarios = match discover(spec, self.config.ordering.as_ref()) {
            Ok(scenarios) => scenarios,
            Err(error) => {
                tracing::warn!(%error, "discovery failed; specification skipped");
                visitor.on_discovery_error(spec, &error);
                return Err(error);
            }
        };
        let executor: &dyn BehaviorExecutor = match mode {
            Mode::Run => self.executor.as_ref(),
            Mode::Visit => &VisitingExecutor,
        };

        visitor.on_specification_start(spec);
        if mode == Mode::Run {
            run_once_hook(spec.name, ONCE_BEFORE_NAME, spec.once_before);
        }

        let mut walk = Walk {
            config: &self.config,
            executor,
            spec,
            summary: RunSummary::default(),
            halted: false,
        };
        for scenario in &scenarios {
            if walk.halted {
                break;
            }
            walk.scenario(scenario, visitor);
        }

        if mode == Mode::Run {
            run_once_hook(spec.name, ONCE_AFTER_NAME, spec.once_after);
        }
        let mut summary = walk.summary;
        summary.duration = started.elapsed();
        visitor.on_specification_end(spec, &summary);
        Ok(summary)
    }
}

/// Best-effort: a failing once hook is logged and otherwise ignored.
fn run_once_hook(spec: &str, name: &str, hook: Option<HookFn>) {
    let Some(hook) = hook else {
        return;
    };
    tracing::debug!(spec, hook = name, "running once hook");
    if let Err(raised) = guarded(hook) {
        tracing::warn!(spec, hook = name, error = %raised, "once hook failed; continuing");
    }
}

struct Walk<'a> {
    config: &'a RunnerConfig,
    executor: &'a dyn BehaviorExecutor,
    spec: &'a SpecType,
    summary: RunSummary,
    halted: bool,
}

impl Walk<'_> {
    fn scenario(&mut self, scenario: &Scenario, visitor: &mut dyn SpecVisitor) {
        if !self.selects(scenario) {
            return;
        }
        visitor.on_scenario_start(scenario);

        for behavior in scenario.behaviors() {
            if self.halted {
                break;
            }
            if !self.config.selects(&behavior.qualified_name()) {
                continue;
            }
            visitor.on_behavior(behavior);
            self.summary.visited += 1;
            let Some(outcome) = self.executor.execute(self.spec, scenario, behavior) else {
                continue;
            };
            self.summary.record(&outcome);
            report_outcome(visitor, behavior, &outcome);
            if self.config.fail_fast && !outcome.is_passed() {
                tracing::debug!(behavior = %behavior.qualified_name(), "fail fast: stopping");
                self.halted = true;
            }
        }

        for nested in scenario.nested() {
            if self.halted {
                break;
            }
            self.scenario(nested, visitor);
        }
        visitor.on_scenario_end(scenario);
    }

    /// Without a filter every scenario is announced; with one, only those containing a match.
    fn selects(&self, scenario: &Scenario) -> bool {
        self.config.filter.is_none()
            || scenario.behaviors().iter().any(|b| self.config.selects(&b.qualified_name()))
            || scenario.nested().iter().any(|n| self.selects(n))
    }
}
