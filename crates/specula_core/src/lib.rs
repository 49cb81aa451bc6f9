//! Shared vocabulary for specula specifications and the engine that runs them.
//!
//! This crate is intentionally small and dependency-light. It holds the pieces that both sides of the
//! engine boundary need:
//! - the reflective descriptors emitted by `#[specification]` ([`descriptor`]),
//! - the [`Specification`] capability surface and its lifecycle seams ([`spec`]),
//! - shared, type-erased subjects ([`subject`]),
//! - the failure and expectation signals a behavior can raise ([`failure`], [`expect`]),
//! - identifier-to-sentence rendering used by reporters ([`sentence`]).
//!
//! ## Notes
//!
//! - No IO and no global state live here. Discovery, execution, and reporting belong to the `specula` crate.

#![deny(clippy::unwrap_used)]

pub mod descriptor;
pub mod expect;
pub mod failure;
pub mod sentence;
pub mod spec;
pub mod subject;

pub use descriptor::{
    HookFn, MethodDescriptor, MethodFn, Receiver, ReturnKind, Returned, ScenarioConstructor, SpecConstructor,
    SpecType, TypeDescriptor, TypeKind, Visibility,
};
pub use expect::{Expectation, ExpectationFailed, Verdict, should, specify, specify_panics, specify_that};
pub use failure::{Failure, InvocationError, MessageError};
pub use spec::{AsAny, ContextHandle, ContextObjectFactory, DefaultContextObjectFactory, LifecycleListener, Specification};
pub use subject::{ContextObject, SlotError, SubjectSlot};

/// Conventional name of a scenario's subject-factory method.
pub const SUBJECT_FACTORY_NAME: &str = "context";

/// Conventional name of a scenario's disposer method.
pub const DISPOSER_NAME: &str = "destroy";

/// Name of the process-wide setup hook on a specification's root type.
pub const ONCE_BEFORE_NAME: &str = "once_before";

/// Name of the process-wide teardown hook on a specification's root type.
pub const ONCE_AFTER_NAME: &str = "once_after";
