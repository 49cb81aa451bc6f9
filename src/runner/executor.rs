//! Behavior execution.
//!
//! [`LifecycleExecutor`] runs one behavior through the full lifecycle:
//!
//! 1. construct a fresh specification,
//! 2. pick the isolation mode it asks for; everything below runs there,
//! 3. `create`,
//! 4. construct the scenario bound to the specification, fire after-instantiation,
//! 5. build the context object, bind it, fire after-creation,
//! 6. invoke the behavior,
//! 7. `verify_mocks`,
//! 8. teardown: disposer, after-destroy, `destroy`. Always runs, each step guarded on its own.
//!
//! The outcome is decided after teardown. The first failure wins: a teardown failure only surfaces when
//! everything before it passed.
//!
//! [`VisitingExecutor`] replaces all of this with nothing, for dry runs.

use std::any::Any;
use std::sync::Arc;

use specula_core::{ContextHandle, Failure, SpecType, Specification};

use super::classify::{Raised, classify, guarded};
use super::discovery::{Behavior, Scenario};
use super::isolation::Isolation;
use super::outcome::{ExecutionError, Outcome};

/// Runs (or skips) one behavior.
pub trait BehaviorExecutor: Send + Sync {
    /// `None` when the behavior was not executed.
    fn execute(&self, spec: &SpecType, scenario: &Scenario, behavior: &Behavior) -> Option<Outcome>;
}

/// Calls a behavior on its scenario instance.
///
/// Host integrations can wrap invocation (rules, around advice). Wrappers that add context to a failure
/// should use [`specula_core::InvocationError`], which the executor unwraps before classifying.
pub trait MethodInvoker: Send + Sync {
    fn invoke(&self, behavior: &Behavior, context: &mut dyn Any) -> Result<(), Failure>;
}

/// Calls the behavior's generated invoker directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectInvoker;

impl MethodInvoker for DirectInvoker {
    fn invoke(&self, behavior: &Behavior, context: &mut dyn Any) -> Result<(), Failure> {
        (behavior.invoker())(context).map(|_| ())
    }
}

/// Executes behaviors under the full lifecycle.
#[derive(Clone)]
pub struct LifecycleExecutor {
    invoker: Arc<dyn MethodInvoker>,
}

impl Default for LifecycleExecutor {
    fn default() -> Self {
        Self {
            invoker: Arc::new(DirectInvoker),
        }
    }
}

impl LifecycleExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route behavior invocation through `invoker`.
    pub fn with_invoker(mut self, invoker: impl MethodInvoker + 'static) -> Self {
        self.invoker = Arc::new(invoker);
        self
    }
}

impl BehaviorExecutor for LifecycleExecutor {
    #[tracing::instrument(skip_all, fields(behavior = %behavior.qualified_name()))]
    fn execute(&self, spec: &SpecType, scenario: &Scenario, behavior: &Behavior) -> Option<Outcome> {
        let instance = match guarded(spec.constructor) {
            Ok(instance) => instance,
            Err(raised) => {
                tracing::debug!(error = %raised, "specification construction failed");
                return Some(classify(raised).into());
            }
        };
        let isolation = Isolation::for_spec(instance.as_ref());
        tracing::debug!(?isolation, "running");

        let invoker = self.invoker.as_ref();
        let outcome = isolation.run(move || run_protocol(instance, scenario, behavior, invoker));
        tracing::debug!(outcome = outcome.label(), "finished");
        Some(outcome)
    }
}

/// Enumerates behaviors without running anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisitingExecutor;

impl BehaviorExecutor for VisitingExecutor {
    fn execute(&self, _spec: &SpecType, _scenario: &Scenario, _behavior: &Behavior) -> Option<Outcome> {
        None
    }
}

fn run_protocol(
    mut spec: Box<dyn Specification>,
    scenario: &Scenario,
    behavior: &Behavior,
    invoker: &dyn MethodInvoker,
) -> Outcome {
    let mut context: Option<Box<dyn Any>> = None;
    let body = run_body(spec.as_mut(), &mut context, scenario, behavior, invoker);
    let teardown = run_teardown(spec.as_mut(), context.as_deref_mut(), scenario);
    settle(body, teardown)
}

fn run_body(
    spec: &mut dyn Specification,
    context: &mut Option<Box<dyn Any>>,
    scenario: &Scenario,
    behavior: &Behavior,
    invoker: &dyn MethodInvoker,
) -> Result<(), Raised> {
    tracing::trace!("create");
    guarded(|| spec.create())?;

    let Some(constructor) = scenario.constructor() else {
        return Err(Raised::Returned(
            ExecutionError::NotInvocable {
                behavior: behavior.qualified_name(),
            }
            .into(),
        ));
    };
    tracing::trace!("instantiate context");
    let instance = context.insert(guarded(|| constructor(&mut *spec))?);
    guarded(|| spec.fire_after_context_instantiation(&mut **instance))?;

    tracing::trace!("create context object");
    let factory = spec.context_object_factory();
    let mut handle = ContextHandle::new(scenario.name(), &mut **instance, scenario.subject_factory());
    let object = guarded(|| factory.new_context_object(&mut handle))?;
    guarded(|| {
        spec.bind_context_object(&object);
        Ok(())
    })?;
    guarded(|| spec.fire_after_context_creation(&mut **instance, &object))?;

    tracing::trace!("invoke");
    guarded(|| invoker.invoke(behavior, &mut **instance))?;

    tracing::trace!("verify mocks");
    guarded(|| spec.verify_mocks())
}

fn run_teardown(
    spec: &mut dyn Specification,
    mut context: Option<&mut dyn Any>,
    scenario: &Scenario,
) -> Result<(), Raised> {
    let mut first: Option<Raised> = None;
    let mut note = |step: &str, result: Result<(), Raised>| {
        if let Err(raised) = result {
            tracing::debug!(step, error = %raised, "teardown step failed");
            first.get_or_insert(raised);
        }
    };

    if let (Some(instance), Some(disposer)) = (context.as_deref_mut(), scenario.disposer()) {
        note("dispose", guarded(|| disposer(instance).map(|_| ())));
    }
    note(
        "after context destroy",
        guarded(|| spec.fire_after_context_destroy(context.as_deref_mut())),
    );
    note("destroy", guarded(|| spec.destroy()));

    first.map_or(Ok(()), Err)
}

/// Decide the reported outcome: the body's failure wins over teardown's.
fn settle(body: Result<(), Raised>, teardown: Result<(), Raised>) -> Outcome {
    match (body, teardown) {
        (Ok(()), Ok(())) => Outcome::Passed,
        (Ok(()), Err(raised)) => Outcome::Error(ExecutionError::Teardown {
            cause: Box::new(classify(raised).into_error()),
        }),
        (Err(raised), teardown) => {
            if let Err(discarded) = teardown {
                tracing::debug!(error = %discarded, "teardown failure discarded after an earlier failure");
            }
            classify(raised).into()
        }
    }
}
