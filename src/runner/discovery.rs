//! Scenario and behavior discovery.
//!
//! Discovery walks the descriptors emitted by `#[specification]` and produces an owned, ordered tree of
//! [`Scenario`]s. It runs to completion before any hook or behavior executes, so a malformed specification
//! is rejected as a whole instead of half-way through a run.
//!
//! Qualifying rules:
//! - a scenario is a struct with a constructor taking the specification, or a nested module containing such
//!   a struct at any depth; `#[ignore]`d types are skipped together with everything nested in them,
//! - a behavior is a `pub`, zero-argument method taking `&self` or `&mut self`, declared on the scenario,
//!   returning nothing or `Result<(), E>`, and neither the subject factory nor the disposer.

use std::fmt;

use miette::Diagnostic;
use specula_core::sentence;
use specula_core::{
    DISPOSER_NAME, MethodDescriptor, MethodFn, SUBJECT_FACTORY_NAME, ScenarioConstructor, SpecType,
    TypeDescriptor, TypeKind, Visibility,
};
use thiserror::Error;

use super::ordering::{MemberOrdering, sorted};

/// A specification whose structure cannot be run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum DiscoveryError {
    #[error("scenario `{scenario}` has more than one subject factory: {candidates}")]
    #[diagnostic(
        code(specula::discovery::ambiguous_subject_factory),
        help("keep a single `context` method, or mark exactly one method with #[subject]")
    )]
    AmbiguousSubjectFactory { scenario: String, candidates: String },

    #[error("scenario `{scenario}` has more than one disposer: {candidates}")]
    #[diagnostic(
        code(specula::discovery::ambiguous_disposer),
        help("keep a single `destroy` method, or mark exactly one method with #[disposer]")
    )]
    AmbiguousDisposer { scenario: String, candidates: String },

    #[error("subject factory `{scenario}::{method}` {problem}")]
    #[diagnostic(
        code(specula::discovery::malformed_subject_factory),
        help("a subject factory looks like `pub fn context(&mut self) -> Subject`")
    )]
    MalformedSubjectFactory {
        scenario: String,
        method: String,
        problem: String,
    },

    #[error("disposer `{scenario}::{method}` {problem}")]
    #[diagnostic(
        code(specula::discovery::malformed_disposer),
        help("a disposer looks like `pub fn destroy(&mut self)` or returns `Result<(), E>`")
    )]
    MalformedDisposer {
        scenario: String,
        method: String,
        problem: String,
    },
}

/// One behavior of a scenario, ready to run.
#[derive(Clone)]
pub struct Behavior {
    name: &'static str,
    scenario: String,
    position: Option<u32>,
    invoker: MethodFn,
}

impl Behavior {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Qualified name of the owning scenario, `Spec::Scenario`.
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// `Spec::Scenario::behavior`
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.scenario, self.name)
    }

    pub fn position(&self) -> Option<u32> {
        self.position
    }

    /// The name as a sentence, e.g. `is_empty` → "is empty".
    pub fn sentence(&self) -> String {
        sentence::from_identifier(self.name)
    }

    pub fn invoker(&self) -> MethodFn {
        self.invoker
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("name", &self.name)
            .field("scenario", &self.scenario)
            .field("position", &self.position)
            .finish()
    }
}

/// A discovered scenario: its behaviors in run order and its nested scenarios.
#[derive(Clone)]
pub struct Scenario {
    spec: &'static str,
    path: Vec<&'static str>,
    kind: TypeKind,
    constructor: Option<ScenarioConstructor>,
    subject_factory: Option<MethodFn>,
    disposer: Option<MethodFn>,
    behaviors: Vec<Behavior>,
    nested: Vec<Scenario>,
}

impl Scenario {
    pub fn name(&self) -> &'static str {
        self.path.last().copied().unwrap_or(self.spec)
    }

    /// Name of the specification this scenario belongs to.
    pub fn spec(&self) -> &'static str {
        self.spec
    }

    /// Scenario names from the specification root down to this one.
    pub fn path(&self) -> &[&'static str] {
        &self.path
    }

    /// Nesting depth; top-level scenarios are 0.
    pub fn depth(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// `Spec::Outer::Inner`
    pub fn qualified_name(&self) -> String {
        qualify(self.spec, &self.path)
    }

    pub fn sentence(&self) -> String {
        sentence::from_identifier(self.name())
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn constructor(&self) -> Option<ScenarioConstructor> {
        self.constructor
    }

    pub fn subject_factory(&self) -> Option<MethodFn> {
        self.subject_factory
    }

    pub fn disposer(&self) -> Option<MethodFn> {
        self.disposer
    }

    pub fn behaviors(&self) -> &[Behavior] {
        &self.behaviors
    }

    pub fn nested(&self) -> &[Scenario] {
        &self.nested
    }

    /// Behaviors of this scenario and of every nested scenario.
    pub fn behavior_count(&self) -> usize {
        self.behaviors.len() + self.nested.iter().map(Scenario::behavior_count).sum::<usize>()
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.qualified_name())
            .field("kind", &self.kind)
            .field("subject_factory", &self.subject_factory.is_some())
            .field("disposer", &self.disposer.is_some())
            .field("behaviors", &self.behaviors)
            .field("nested", &self.nested)
            .finish()
    }
}

/// Discover the scenario tree of `spec`.
#[tracing::instrument(skip_all, fields(spec = spec.name, members = spec.members.len()))]
pub fn discover(spec: &SpecType, ordering: &dyn MemberOrdering) -> Result<Vec<Scenario>, DiscoveryError> {
    let scenarios = discover_members(spec.name, spec.name, &[], &spec.members, ordering)?;
    tracing::debug!(
        scenarios = scenarios.len(),
        behaviors = scenarios.iter().map(Scenario::behavior_count).sum::<usize>(),
        "discovered"
    );
    Ok(scenarios)
}

/// Whether `ty` is a scenario: not ignored, and either bound to its specification or a module grouping at
/// least one such scenario, however deeply nested.
pub fn qualifies(ty: &TypeDescriptor) -> bool {
    if ty.ignored {
        return false;
    }
    match ty.kind {
        TypeKind::Module => ty.nested.iter().any(qualifies),
        _ => ty.is_enclosing_bound(),
    }
}

fn discover_members(
    spec: &'static str,
    owner: &str,
    path: &[&'static str],
    members: &[TypeDescriptor],
    ordering: &dyn MemberOrdering,
) -> Result<Vec<Scenario>, DiscoveryError> {
    let mut scenarios = Vec::new();
    for ty in sorted(ordering, owner, members) {
        if !qualifies(ty) {
            if ty.ignored {
                tracing::debug!(scenario = ty.name, "skipping ignored scenario");
            }
            continue;
        }
        let mut scenario_path = path.to_vec();
        scenario_path.push(ty.name);
        scenarios.push(discover_scenario(spec, scenario_path, ty, ordering)?);
    }
    Ok(scenarios)
}

fn discover_scenario(
    spec: &'static str,
    path: Vec<&'static str>,
    ty: &TypeDescriptor,
    ordering: &dyn MemberOrdering,
) -> Result<Scenario, DiscoveryError> {
    let qualified = qualify(spec, &path);
    let own: Vec<&MethodDescriptor> = ty.methods.iter().filter(|m| m.declared_on == ty.name).collect();

    let factory = single(
        &own,
        |m| m.subject_marker || m.name == SUBJECT_FACTORY_NAME,
        |candidates| DiscoveryError::AmbiguousSubjectFactory {
            scenario: qualified.clone(),
            candidates,
        },
    )?;
    let disposer = single(
        &own,
        |m| m.disposer_marker || m.name == DISPOSER_NAME,
        |candidates| DiscoveryError::AmbiguousDisposer {
            scenario: qualified.clone(),
            candidates,
        },
    )?;

    let subject_factory = factory
        .map(|m| {
            check_shape(m, |m| m.returns.is_unit().then_some("must return the subject")).map_err(|problem| {
                DiscoveryError::MalformedSubjectFactory {
                    scenario: qualified.clone(),
                    method: m.name.to_string(),
                    problem,
                }
            })
        })
        .transpose()?;
    let disposer_fn = disposer
        .map(|m| {
            check_shape(m, |m| (!m.returns.is_unit()).then_some("must not return a value")).map_err(|problem| {
                DiscoveryError::MalformedDisposer {
                    scenario: qualified.clone(),
                    method: m.name.to_string(),
                    problem,
                }
            })
        })
        .transpose()?;

    let is_special = |m: &MethodDescriptor| {
        factory.is_some_and(|f| std::ptr::eq(f, m)) || disposer.is_some_and(|d| std::ptr::eq(d, m))
    };
    let behaviors = sorted(ordering, &qualified, &ty.methods)
        .into_iter()
        .filter(|m| is_behavior(ty, m) && !is_special(*m))
        .filter_map(|m| {
            Some(Behavior {
                name: m.name,
                scenario: qualified.clone(),
                position: m.position,
                invoker: m.invoker?,
            })
        })
        .collect();

    let nested = discover_members(spec, &qualified, &path, &ty.nested, ordering)?;

    Ok(Scenario {
        spec,
        path,
        kind: ty.kind,
        constructor: ty.constructor,
        subject_factory,
        disposer: disposer_fn,
        behaviors,
        nested,
    })
}

fn is_behavior(owner: &TypeDescriptor, method: &MethodDescriptor) -> bool {
    method.declared_on == owner.name
        && method.visibility == Visibility::Public
        && method.receiver.is_by_reference()
        && method.arity == 0
        && method.returns.is_unit()
        && method.invoker.is_some()
}

/// The single method matching `is_candidate`, if any; more than one is an error.
fn single<'a>(
    methods: &[&'a MethodDescriptor],
    is_candidate: impl Fn(&MethodDescriptor) -> bool,
    ambiguous: impl FnOnce(String) -> DiscoveryError,
) -> Result<Option<&'a MethodDescriptor>, DiscoveryError> {
    let candidates: Vec<&'a MethodDescriptor> = methods.iter().copied().filter(|m| is_candidate(*m)).collect();
    match candidates.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(*only)),
        many => Err(ambiguous(
            many.iter().map(|m| format!("`{}`", m.name)).collect::<Vec<_>>().join(", "),
        )),
    }
}

/// Shared checks for the subject factory and the disposer, then the role-specific `returns` check.
fn check_shape(
    method: &MethodDescriptor,
    returns: impl Fn(&MethodDescriptor) -> Option<&'static str>,
) -> Result<MethodFn, String> {
    if method.visibility != Visibility::Public {
        return Err("must be `pub`".to_string());
    }
    if !method.receiver.is_by_reference() {
        return Err("must take `&self` or `&mut self`".to_string());
    }
    if method.arity != 0 {
        return Err(format!("must not take arguments (takes {})", method.arity));
    }
    if let Some(problem) = returns(method) {
        return Err(problem.to_string());
    }
    method
        .invoker
        .ok_or_else(|| "cannot be invoked dynamically (generic, async, or unsafe)".to_string())
}

fn qualify(spec: &str, path: &[&str]) -> String {
    let mut name = spec.to_string();
    for segment in path {
        name.push_str("::");
        name.push_str(segment);
    }
    name
}
