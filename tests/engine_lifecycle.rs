//! End-to-end runs of `#[specification]` modules through `SpecRunner`.
//!
//! Every specification here logs into its own `Journal` and is run by exactly one test, so the tests can
//! run in parallel without seeing each other's events.

#![allow(clippy::unwrap_used)]

mod support;

use std::any::Any;

use specula::runner::{Behavior, DirectInvoker, LifecycleExecutor, MethodInvoker, NameOrder};
use specula::{Failure, InvocationError, RunnerConfig, SpecRunner};
use support::Recorder;

#[derive(Debug, thiserror::Error)]
#[error("boom")]
pub struct Boom;

// ========================================
// Lifecycle order
// ========================================

#[specula::specification]
mod lifecycle_spec {
    use std::any::Any;
    use std::sync::Arc;

    use specula::prelude::*;

    use crate::support::Journal;

    pub static JOURNAL: Journal = Journal::new();

    struct Listener;

    impl LifecycleListener for Listener {
        fn after_context_instantiation(&self, _context: &mut dyn Any) -> Result<(), Failure> {
            JOURNAL.record("after_instantiation");
            Ok(())
        }

        fn after_context_creation(&self, _context: &mut dyn Any, object: &ContextObject) -> Result<(), Failure> {
            let subject = object.with(|n: &mut u32| *n).unwrap_or_default();
            JOURNAL.record(format!("after_creation:{subject}"));
            Ok(())
        }

        fn after_context_destroy(&self, context: Option<&mut dyn Any>) -> Result<(), Failure> {
            JOURNAL.record(if context.is_some() { "after_destroy" } else { "after_destroy:none" });
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct LifecycleSpec {
        subject: SubjectSlot<u32>,
    }

    impl LifecycleSpec {
        pub fn once_before() {
            JOURNAL.record("once_before");
        }

        pub fn once_after() {
            JOURNAL.record("once_after");
        }
    }

    impl Specification for LifecycleSpec {
        fn create(&mut self) -> Result<(), Failure> {
            JOURNAL.record("create");
            Ok(())
        }

        fn destroy(&mut self) -> Result<(), Failure> {
            JOURNAL.record("destroy");
            Ok(())
        }

        fn verify_mocks(&mut self) -> Result<(), Failure> {
            JOURNAL.record("verify");
            Ok(())
        }

        fn bind_context_object(&mut self, object: &ContextObject) {
            JOURNAL.record("bind");
            self.subject.bind(object);
        }

        fn lifecycle_listeners(&self) -> Vec<Arc<dyn LifecycleListener>> {
            let listener: Arc<dyn LifecycleListener> = Arc::new(Listener);
            vec![listener]
        }
    }

    pub struct Counting {
        subject: SubjectSlot<u32>,
    }

    impl Counting {
        pub fn new(spec: &mut LifecycleSpec) -> Self {
            JOURNAL.record("new");
            Self {
                subject: spec.subject.clone(),
            }
        }

        pub fn context(&mut self) -> u32 {
            JOURNAL.record("context");
            41
        }

        pub fn increments(&mut self) {
            let value = self.subject.with(|n| {
                *n += 1;
                *n
            });
            JOURNAL.record(format!("increments:{value}"));
        }

        pub fn starts_fresh(&mut self) {
            self.subject.with(|n| specify(&*n, should::equal(41)));
            JOURNAL.record("starts_fresh");
        }

        pub fn destroy(&mut self) {
            JOURNAL.record("dispose");
        }
    }
}

#[test]
fn test_lifecycle_runs_in_order_for_every_behavior() {
    let mut recorder = Recorder::default();
    let summary = SpecRunner::default()
        .run(&lifecycle_spec::specification(), &mut recorder)
        .unwrap();
    assert_eq!(summary.passed, 2);
    assert!(summary.is_success());

    let round = |behavior: &'static str| {
        vec![
            "create",
            "new",
            "after_instantiation",
            "context",
            "bind",
            "after_creation:41",
            behavior,
            "verify",
            "dispose",
            "after_destroy",
            "destroy",
        ]
    };
    let mut expected = vec!["once_before"];
    expected.extend(round("increments:42"));
    expected.extend(round("starts_fresh"));
    expected.push("once_after");
    assert_eq!(lifecycle_spec::JOURNAL.take(), expected);

    assert_eq!(
        recorder.events,
        vec![
            "spec LifecycleSpec",
            "scenario LifecycleSpec::Counting",
            "behavior LifecycleSpec::Counting::increments",
            "passed LifecycleSpec::Counting::increments",
            "behavior LifecycleSpec::Counting::starts_fresh",
            "passed LifecycleSpec::Counting::starts_fresh",
            "end scenario LifecycleSpec::Counting",
            "end spec LifecycleSpec",
            "complete",
        ]
    );
}

// ========================================
// Outcome classification
// ========================================

#[specula::specification]
mod outcomes_spec {
    use specula::prelude::*;

    #[derive(Default)]
    pub struct OutcomesSpec {
        name: SubjectSlot<String>,
    }

    impl Specification for OutcomesSpec {
        fn bind_context_object(&mut self, object: &ContextObject) {
            self.name.bind(object);
        }
    }

    pub struct Checks {
        name: SubjectSlot<String>,
    }

    impl Checks {
        pub fn new(spec: &mut OutcomesSpec) -> Self {
            Self {
                name: spec.name.clone(),
            }
        }

        pub fn holds(&mut self) {}

        pub fn does_not_hold(&mut self) {
            specify(&(1 + 1), should::equal(3));
        }

        pub fn returns_an_error(&mut self) -> Result<(), super::Boom> {
            Err(super::Boom)
        }

        pub fn returns_a_mismatch(&mut self) -> Result<(), Failure> {
            Err(ExpectationFailed::new("returned, not raised").into())
        }

        pub fn panics(&mut self) {
            panic!("kaboom");
        }

        pub fn reads_a_subject_of_the_wrong_type(&mut self) {
            self.name.with(|name| name.push('!'));
        }

        pub fn expects_a_panic(&mut self) {
            specify_panics(|| panic!("expected"), Some("expected"));
        }
    }
}

#[test]
fn test_outcomes_are_classified() {
    let mut recorder = Recorder::default();
    let summary = SpecRunner::default()
        .run(&outcomes_spec::specification(), &mut recorder)
        .unwrap();
    assert_eq!((summary.passed, summary.mismatched, summary.errored), (2, 2, 3));

    assert_eq!(
        recorder.outcomes(),
        vec![
            "passed OutcomesSpec::Checks::holds",
            "mismatch OutcomesSpec::Checks::does_not_hold: Expected: 3, but was: 2",
            "error OutcomesSpec::Checks::returns_an_error: boom",
            "mismatch OutcomesSpec::Checks::returns_a_mismatch: returned, not raised",
            "error OutcomesSpec::Checks::panics: panicked: kaboom",
            "error OutcomesSpec::Checks::reads_a_subject_of_the_wrong_type: context object has type `()`, expected `alloc::string::String`",
            "passed OutcomesSpec::Checks::expects_a_panic",
        ]
    );

    let raised = &recorder.errors[0];
    assert_eq!(raised.cause.as_deref(), Some("Boom"));
    assert!(!raised.panicked);
    let panicked = &recorder.errors[1];
    assert!(panicked.panicked);
    assert_eq!(panicked.cause, None);
}

// ========================================
// Construction failures
// ========================================

#[specula::specification]
mod construction_spec {
    use std::any::Any;
    use std::sync::Arc;

    use specula::prelude::*;

    use crate::support::Journal;

    pub static JOURNAL: Journal = Journal::new();

    struct Listener;

    impl LifecycleListener for Listener {
        fn after_context_instantiation(&self, _context: &mut dyn Any) -> Result<(), Failure> {
            JOURNAL.record("after_instantiation");
            Ok(())
        }

        fn after_context_creation(&self, _context: &mut dyn Any, _object: &ContextObject) -> Result<(), Failure> {
            JOURNAL.record("after_creation");
            Ok(())
        }

        fn after_context_destroy(&self, context: Option<&mut dyn Any>) -> Result<(), Failure> {
            JOURNAL.record(if context.is_some() { "after_destroy" } else { "after_destroy:none" });
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct ConstructionSpec;

    impl Specification for ConstructionSpec {
        fn create(&mut self) -> Result<(), Failure> {
            JOURNAL.record("create");
            Ok(())
        }

        fn destroy(&mut self) -> Result<(), Failure> {
            JOURNAL.record("destroy");
            Ok(())
        }

        fn lifecycle_listeners(&self) -> Vec<Arc<dyn LifecycleListener>> {
            let listener: Arc<dyn LifecycleListener> = Arc::new(Listener);
            vec![listener]
        }
    }

    pub struct BrokenConstructor;

    impl BrokenConstructor {
        pub fn new(_spec: &mut ConstructionSpec) -> Result<Self, super::Boom> {
            JOURNAL.record("new");
            Err(super::Boom)
        }

        pub fn never_runs(&mut self) {
            JOURNAL.record("behavior");
        }

        pub fn destroy(&mut self) {
            JOURNAL.record("dispose");
        }
    }

    pub struct BrokenFactory;

    impl BrokenFactory {
        pub fn new(_spec: &mut ConstructionSpec) -> Self {
            JOURNAL.record("new");
            Self
        }

        pub fn context(&mut self) -> Result<u32, super::Boom> {
            JOURNAL.record("context");
            Err(super::Boom)
        }

        pub fn never_runs(&mut self) {
            JOURNAL.record("behavior");
        }

        pub fn destroy(&mut self) {
            JOURNAL.record("dispose");
        }
    }
}

#[test]
fn test_construction_failures_report_the_original_cause_and_still_tear_down() {
    let mut recorder = Recorder::default();
    let summary = SpecRunner::default()
        .run(&construction_spec::specification(), &mut recorder)
        .unwrap();
    assert_eq!(summary.errored, 2);

    assert_eq!(
        construction_spec::JOURNAL.take(),
        vec![
            // scenario constructor fails: no context, so no disposer and no creation hooks
            "create",
            "new",
            "after_destroy:none",
            "destroy",
            // subject factory fails: the context exists and is disposed
            "create",
            "new",
            "after_instantiation",
            "context",
            "dispose",
            "after_destroy",
            "destroy",
        ]
    );
    for error in &recorder.errors {
        assert_eq!(error.cause.as_deref(), Some("Boom"), "{}", error.behavior);
        assert!(!error.teardown);
    }
}

// ========================================
// Ignored members
// ========================================

#[specula::specification]
mod ignored_spec {
    use specula::prelude::*;

    use crate::support::Journal;

    pub static JOURNAL: Journal = Journal::new();

    #[derive(Default)]
    pub struct IgnoredSpec;

    impl Specification for IgnoredSpec {}

    pub struct Kept;

    impl Kept {
        pub fn new(_spec: &mut IgnoredSpec) -> Self {
            Self
        }

        pub fn runs(&mut self) {
            JOURNAL.record("kept");
        }
    }

    #[ignore]
    pub struct Skipped;

    impl Skipped {
        pub fn new(_spec: &mut IgnoredSpec) -> Self {
            Self
        }

        pub fn never_runs(&mut self) {
            JOURNAL.record("skipped");
        }
    }

    #[ignore]
    pub mod skipped_group {
        use super::{IgnoredSpec, JOURNAL};

        pub struct Inner;

        impl Inner {
            pub fn new(_spec: &mut IgnoredSpec) -> Self {
                Self
            }

            pub fn never_runs(&mut self) {
                JOURNAL.record("inner");
            }
        }
    }
}

#[test]
fn test_ignored_scenarios_and_groups_yield_no_behaviors() {
    let mut recorder = Recorder::default();
    let summary = SpecRunner::default()
        .run(&ignored_spec::specification(), &mut recorder)
        .unwrap();
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.visited, 1);
    assert_eq!(ignored_spec::JOURNAL.take(), vec!["kept"]);
    assert!(!recorder.events.iter().any(|e| e.contains("Skipped") || e.contains("skipped_group")));
}

// ========================================
// Teardown
// ========================================

#[specula::specification]
mod teardown_spec {
    use std::any::Any;
    use std::sync::Arc;

    use specula::prelude::*;

    use crate::support::Journal;

    pub static JOURNAL: Journal = Journal::new();

    struct Listener;

    impl LifecycleListener for Listener {
        fn after_context_destroy(&self, _context: Option<&mut dyn Any>) -> Result<(), Failure> {
            JOURNAL.record("after_destroy");
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct TeardownSpec;

    impl Specification for TeardownSpec {
        fn destroy(&mut self) -> Result<(), Failure> {
            JOURNAL.record("destroy");
            Ok(())
        }

        fn lifecycle_listeners(&self) -> Vec<Arc<dyn LifecycleListener>> {
            let listener: Arc<dyn LifecycleListener> = Arc::new(Listener);
            vec![listener]
        }
    }

    pub struct MismatchThenBadDisposer;

    impl MismatchThenBadDisposer {
        pub fn new(_spec: &mut TeardownSpec) -> Self {
            Self
        }

        pub fn fails(&mut self) {
            specify_that(false, "the behavior failed first");
        }

        pub fn destroy(&mut self) -> Result<(), super::Boom> {
            JOURNAL.record("dispose:mismatch");
            Err(super::Boom)
        }
    }

    pub struct PanicThenDisposer;

    impl PanicThenDisposer {
        pub fn new(_spec: &mut TeardownSpec) -> Self {
            Self
        }

        pub fn panics(&mut self) {
            panic!("behavior panicked");
        }

        pub fn destroy(&mut self) {
            JOURNAL.record("dispose:panic");
        }
    }

    pub struct PassThenBadDisposer;

    impl PassThenBadDisposer {
        pub fn new(_spec: &mut TeardownSpec) -> Self {
            Self
        }

        pub fn passes(&mut self) {}

        pub fn destroy(&mut self) -> Result<(), super::Boom> {
            JOURNAL.record("dispose:pass");
            Err(super::Boom)
        }
    }
}

#[test]
fn test_teardown_runs_once_and_never_masks_an_earlier_failure() {
    let mut recorder = Recorder::default();
    let summary = SpecRunner::default()
        .run(&teardown_spec::specification(), &mut recorder)
        .unwrap();
    assert_eq!((summary.passed, summary.mismatched, summary.errored), (0, 1, 2));

    let outcomes = recorder.outcomes();
    assert_eq!(
        outcomes[0],
        "mismatch TeardownSpec::MismatchThenBadDisposer::fails: the behavior failed first"
    );
    assert_eq!(
        outcomes[1],
        "error TeardownSpec::PanicThenDisposer::panics: panicked: behavior panicked"
    );
    assert_eq!(
        outcomes[2],
        "error TeardownSpec::PassThenBadDisposer::passes: teardown failed: boom"
    );

    let promoted = recorder.errors.last().unwrap();
    assert!(promoted.teardown);
    assert_eq!(promoted.cause.as_deref(), Some("Boom"));

    let journal = &teardown_spec::JOURNAL;
    for disposer in ["dispose:mismatch", "dispose:panic", "dispose:pass"] {
        assert_eq!(journal.count(disposer), 1, "{disposer}");
    }
    assert_eq!(journal.count("after_destroy"), 3);
    assert_eq!(journal.count("destroy"), 3);
}

// ========================================
// Thread isolation
// ========================================

#[specula::specification]
mod isolation_spec {
    use std::cell::Cell;
    use std::thread;

    use specula::prelude::*;

    use crate::support::Journal;

    pub static JOURNAL: Journal = Journal::new();

    thread_local! {
        pub static MARK: Cell<u32> = const { Cell::new(0) };
    }

    #[derive(Default)]
    pub struct IsolationSpec;

    impl Specification for IsolationSpec {
        fn needs_thread_isolation(&self) -> bool {
            true
        }
    }

    pub struct OnItsOwnThread;

    impl OnItsOwnThread {
        pub fn new(_spec: &mut IsolationSpec) -> Self {
            Self
        }

        pub fn records_where_it_ran(&mut self) {
            let current = thread::current();
            JOURNAL.record(format!("thread:{}", current.name().unwrap_or("<unnamed>")));
            JOURNAL.record(format!("mark:{}", MARK.with(Cell::get)));
        }
    }
}

#[test]
fn test_isolated_behavior_runs_on_a_fresh_thread_and_finishes_before_run_returns() {
    isolation_spec::MARK.with(|mark| mark.set(7));

    let mut recorder = Recorder::default();
    let summary = SpecRunner::default()
        .run(&isolation_spec::specification(), &mut recorder)
        .unwrap();
    assert_eq!(summary.passed, 1);

    assert_eq!(
        isolation_spec::JOURNAL.take(),
        vec!["thread:specula-isolated", "mark:0"]
    );
    assert_eq!(isolation_spec::MARK.with(|mark| mark.get()), 7);
}

// ========================================
// Ordering
// ========================================

#[specula::specification]
mod ordering_spec {
    use specula::prelude::*;

    #[derive(Default)]
    pub struct OrderingSpec;

    impl Specification for OrderingSpec {}

    pub struct Second;

    impl Second {
        pub fn new(_spec: &mut OrderingSpec) -> Self {
            Self
        }

        pub fn zebra(&mut self) {}

        pub fn apple(&mut self) {}

        pub fn mango(&mut self) {}
    }

    pub struct First;

    impl First {
        pub fn new(_spec: &mut OrderingSpec) -> Self {
            Self
        }

        pub fn only(&mut self) {}
    }
}

#[test]
fn test_declaration_order_is_stable_across_runs() {
    let spec = ordering_spec::specification();
    let runner = SpecRunner::default();

    let mut first = Recorder::default();
    runner.run(&spec, &mut first).unwrap();
    let mut second = Recorder::default();
    runner.run(&spec, &mut second).unwrap();

    assert_eq!(first.events, second.events);
    assert_eq!(
        first.outcomes(),
        vec![
            "passed OrderingSpec::Second::zebra",
            "passed OrderingSpec::Second::apple",
            "passed OrderingSpec::Second::mango",
            "passed OrderingSpec::First::only",
        ]
    );

    let mut by_name = Recorder::default();
    SpecRunner::new(RunnerConfig::new().with_ordering(NameOrder))
        .run(&spec, &mut by_name)
        .unwrap();
    assert_eq!(
        by_name.outcomes(),
        vec![
            "passed OrderingSpec::First::only",
            "passed OrderingSpec::Second::apple",
            "passed OrderingSpec::Second::mango",
            "passed OrderingSpec::Second::zebra",
        ]
    );
}

// ========================================
// Once hooks
// ========================================

#[specula::specification]
mod hooks_spec {
    use specula::prelude::*;

    use crate::support::Journal;

    pub static JOURNAL: Journal = Journal::new();

    #[derive(Default)]
    pub struct HooksSpec;

    impl HooksSpec {
        pub fn once_before() -> Result<(), super::Boom> {
            JOURNAL.record("once_before");
            Err(super::Boom)
        }

        pub fn once_after() {
            JOURNAL.record("once_after");
            panic!("once_after blew up");
        }
    }

    impl Specification for HooksSpec {}

    pub struct Between;

    impl Between {
        pub fn new(_spec: &mut HooksSpec) -> Self {
            Self
        }

        pub fn runs(&mut self) {
            JOURNAL.record("behavior");
        }
    }
}

#[test]
fn test_failing_once_hooks_are_swallowed() {
    let mut recorder = Recorder::default();
    let summary = SpecRunner::default()
        .run(&hooks_spec::specification(), &mut recorder)
        .unwrap();
    assert_eq!(summary.passed, 1);
    assert!(summary.is_success());
    assert_eq!(hooks_spec::JOURNAL.take(), vec!["once_before", "behavior", "once_after"]);
    assert_eq!(recorder.events.last().map(String::as_str), Some("complete"));
}

// ========================================
// Selection: filter, fail fast, visit
// ========================================

#[specula::specification]
mod filter_spec {
    use specula::prelude::*;

    use crate::support::Journal;

    pub static JOURNAL: Journal = Journal::new();

    #[derive(Default)]
    pub struct FilterSpec;

    impl Specification for FilterSpec {}

    pub struct Alpha;

    impl Alpha {
        pub fn new(_spec: &mut FilterSpec) -> Self {
            Self
        }

        pub fn finds_the_needle(&mut self) {
            JOURNAL.record("finds_the_needle");
        }

        pub fn does_something_else(&mut self) {
            JOURNAL.record("does_something_else");
        }
    }

    pub struct Beta;

    impl Beta {
        pub fn new(_spec: &mut FilterSpec) -> Self {
            Self
        }

        pub fn is_unrelated(&mut self) {
            JOURNAL.record("is_unrelated");
        }
    }

    pub mod group {
        use super::{FilterSpec, JOURNAL};

        pub struct Gamma;

        impl Gamma {
            pub fn new(_spec: &mut FilterSpec) -> Self {
                Self
            }

            pub fn also_has_a_needle(&mut self) {
                JOURNAL.record("also_has_a_needle");
            }
        }
    }
}

#[test]
fn test_filter_runs_matching_behaviors_and_hides_empty_scenarios() {
    let mut recorder = Recorder::default();
    let summary = SpecRunner::new(RunnerConfig::new().with_filter("needle"))
        .run(&filter_spec::specification(), &mut recorder)
        .unwrap();
    assert_eq!(summary.passed, 2);
    assert_eq!(
        filter_spec::JOURNAL.take(),
        vec!["finds_the_needle", "also_has_a_needle"]
    );
    assert_eq!(
        recorder.events,
        vec![
            "spec FilterSpec",
            "scenario FilterSpec::Alpha",
            "behavior FilterSpec::Alpha::finds_the_needle",
            "passed FilterSpec::Alpha::finds_the_needle",
            "end scenario FilterSpec::Alpha",
            "scenario FilterSpec::group",
            "scenario FilterSpec::group::Gamma",
            "behavior FilterSpec::group::Gamma::also_has_a_needle",
            "passed FilterSpec::group::Gamma::also_has_a_needle",
            "end scenario FilterSpec::group::Gamma",
            "end scenario FilterSpec::group",
            "end spec FilterSpec",
            "complete",
        ]
    );
}

#[specula::specification]
mod fail_fast_spec {
    use specula::prelude::*;

    use crate::support::Journal;

    pub static JOURNAL: Journal = Journal::new();

    #[derive(Default)]
    pub struct FailFastSpec;

    impl FailFastSpec {
        pub fn once_after() {
            JOURNAL.record("once_after");
        }
    }

    impl Specification for FailFastSpec {}

    pub struct First;

    impl First {
        pub fn new(_spec: &mut FailFastSpec) -> Self {
            Self
        }

        pub fn fails(&mut self) {
            JOURNAL.record("fails");
            specify_that(false, "stop here");
        }

        pub fn never_runs(&mut self) {
            JOURNAL.record("never_runs");
        }
    }

    pub struct Second;

    impl Second {
        pub fn new(_spec: &mut FailFastSpec) -> Self {
            Self
        }

        pub fn never_runs_either(&mut self) {
            JOURNAL.record("never_runs_either");
        }
    }
}

#[specula::specification]
mod untouched_spec {
    use specula::prelude::*;

    use crate::support::Journal;

    pub static JOURNAL: Journal = Journal::new();

    #[derive(Default)]
    pub struct UntouchedSpec;

    impl Specification for UntouchedSpec {}

    pub struct Anything;

    impl Anything {
        pub fn new(_spec: &mut UntouchedSpec) -> Self {
            Self
        }

        pub fn runs(&mut self) {
            JOURNAL.record("runs");
        }
    }
}

#[test]
fn test_fail_fast_stops_the_run_after_the_first_failure() {
    let specs = [fail_fast_spec::specification(), untouched_spec::specification()];
    let mut recorder = Recorder::default();
    let summary = SpecRunner::new(RunnerConfig::new().with_fail_fast(true)).run_all(&specs, &mut recorder);

    assert_eq!((summary.passed, summary.mismatched, summary.visited), (0, 1, 1));
    assert_eq!(fail_fast_spec::JOURNAL.take(), vec!["fails", "once_after"]);
    assert!(untouched_spec::JOURNAL.take().is_empty());
    assert_eq!(
        recorder.events,
        vec![
            "spec FailFastSpec",
            "scenario FailFastSpec::First",
            "behavior FailFastSpec::First::fails",
            "mismatch FailFastSpec::First::fails: stop here",
            "end scenario FailFastSpec::First",
            "end spec FailFastSpec",
            "complete",
        ]
    );
}

#[specula::specification]
mod visit_spec {
    use specula::prelude::*;

    use crate::support::Journal;

    pub static JOURNAL: Journal = Journal::new();

    #[derive(Default)]
    pub struct VisitSpec;

    impl VisitSpec {
        pub fn once_before() {
            JOURNAL.record("once_before");
        }
    }

    impl Specification for VisitSpec {
        fn create(&mut self) -> Result<(), Failure> {
            JOURNAL.record("create");
            Ok(())
        }
    }

    pub struct Listed;

    impl Listed {
        pub fn new(_spec: &mut VisitSpec) -> Self {
            JOURNAL.record("new");
            Self
        }

        pub fn first(&mut self) {
            JOURNAL.record("first");
        }

        pub fn second(&mut self) {
            JOURNAL.record("second");
        }
    }
}

#[test]
fn test_visit_announces_structure_without_running_anything() {
    let mut recorder = Recorder::default();
    let summary = SpecRunner::default()
        .visit(&visit_spec::specification(), &mut recorder)
        .unwrap();

    assert_eq!(summary.visited, 2);
    assert_eq!(summary.passed + summary.failed(), 0);
    assert!(visit_spec::JOURNAL.take().is_empty());
    assert!(recorder.outcomes().is_empty());
    assert_eq!(
        recorder.events,
        vec![
            "spec VisitSpec",
            "scenario VisitSpec::Listed",
            "behavior VisitSpec::Listed::first",
            "behavior VisitSpec::Listed::second",
            "end scenario VisitSpec::Listed",
            "end spec VisitSpec",
            "complete",
        ]
    );
}

// ========================================
// Invocation seam
// ========================================

#[specula::specification]
mod invoker_spec {
    use specula::prelude::*;

    use crate::support::Journal;

    pub static JOURNAL: Journal = Journal::new();

    #[derive(Default)]
    pub struct InvokerSpec;

    impl Specification for InvokerSpec {}

    pub struct Wrapped;

    impl Wrapped {
        pub fn new(_spec: &mut InvokerSpec) -> Self {
            Self
        }

        pub fn mismatches(&mut self) -> Result<(), Failure> {
            JOURNAL.record("mismatches");
            Err(ExpectationFailed::new("wrapped mismatch").into())
        }

        pub fn errors(&mut self) -> Result<(), super::Boom> {
            JOURNAL.record("errors");
            Err(super::Boom)
        }
    }
}

/// Around-advice that wraps every failure in an `InvocationError`.
struct Around;

impl MethodInvoker for Around {
    fn invoke(&self, behavior: &Behavior, context: &mut dyn Any) -> Result<(), Failure> {
        invoker_spec::JOURNAL.record(format!("before:{}", behavior.name()));
        let result = DirectInvoker.invoke(behavior, context);
        invoker_spec::JOURNAL.record(format!("after:{}", behavior.name()));
        result.map_err(|cause| InvocationError::new(behavior.name(), cause).into())
    }
}

#[test]
fn test_custom_invoker_wraps_invocation_without_changing_classification() {
    let runner = SpecRunner::default().with_executor(LifecycleExecutor::new().with_invoker(Around));
    let mut recorder = Recorder::default();
    let summary = runner.run(&invoker_spec::specification(), &mut recorder).unwrap();

    assert_eq!((summary.mismatched, summary.errored), (1, 1));
    assert_eq!(
        invoker_spec::JOURNAL.take(),
        vec![
            "before:mismatches",
            "mismatches",
            "after:mismatches",
            "before:errors",
            "errors",
            "after:errors",
        ]
    );
    assert_eq!(
        recorder.outcomes()[0],
        "mismatch InvokerSpec::Wrapped::mismatches: wrapped mismatch"
    );
    assert_eq!(recorder.errors[0].cause.as_deref(), Some("Boom"));
}
