#![forbid(unsafe_code)]
//! Specula: specification-style behavior runner
//!
//! A specification is an inline module annotated with [`specification`]. Its structs with a constructor
//! taking the specification are scenarios; their public zero-argument methods are behaviors. The engine
//! discovers that tree at run time, runs every behavior against a fresh specification under a strict
//! lifecycle, and reports `Passed`, `Mismatch` (an expectation did not hold), or `Error` (anything else).
//!
//! ```ignore
//! use specula::prelude::*;
//!
//! #[specification]
//! mod stack_spec {
//!     use specula::prelude::*;
//!
//!     #[derive(Default)]
//!     pub struct StackSpec {
//!         stack: SubjectSlot<Vec<i32>>,
//!     }
//!
//!     impl Specification for StackSpec {
//!         fn bind_context_object(&mut self, object: &ContextObject) {
//!             self.stack.bind(object);
//!         }
//!     }
//!
//!     pub struct EmptyStack {
//!         stack: SubjectSlot<Vec<i32>>,
//!     }
//!
//!     impl EmptyStack {
//!         pub fn new(spec: &mut StackSpec) -> Self {
//!             Self { stack: spec.stack.clone() }
//!         }
//!
//!         pub fn context(&mut self) -> Vec<i32> {
//!             Vec::new()
//!         }
//!
//!         pub fn is_empty(&mut self) {
//!             self.stack.with(|stack| specify(&stack.len(), should::equal(0)));
//!         }
//!     }
//! }
//!
//! fn main() {
//!     specula::cli::run(&[stack_spec::specification()]);
//! }
//! ```
//!
//! ## Panic Policy
//!
//! - **Library code**: `Result`/`Option` with `?`. The `cli` module enforces `#![deny(clippy::unwrap_used)]`.
//! - **Specification code**: panicking is how an expectation reports a mismatch; the engine catches every
//!   unwind at the behavior boundary.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

extern crate self as specula;

pub mod cli;
pub mod config;
pub mod report;
pub mod runner;

pub use specula_core::{
    AsAny, ContextHandle, ContextObject, ContextObjectFactory, DefaultContextObjectFactory, Expectation,
    ExpectationFailed, Failure, InvocationError, LifecycleListener, MessageError, SlotError, SpecType,
    Specification, SubjectSlot, Verdict, sentence, should, specify, specify_panics, specify_that,
};
pub use specula_derive::specification;

pub use config::RunnerConfig;
pub use runner::{Outcome, RunSummary, SpecRunner, SpecVisitor};

/// Everything a specification module usually needs.
pub mod prelude {
    pub use specula_core::{
        ContextObject, ContextObjectFactory, ExpectationFailed, Failure, LifecycleListener, Specification,
        SubjectSlot, Verdict, should, specify, specify_panics, specify_that,
    };
    pub use specula_derive::specification;
}

/// Paths used by code generated by `#[specification]`. Not public API.
#[doc(hidden)]
pub mod __private {
    pub use specula_core::descriptor::{
        MethodDescriptor, Receiver, ReturnKind, Returned, TypeDescriptor, Visibility, downcast_context_mut,
        downcast_spec_mut,
    };
    pub use specula_core::subject::ContextObject;
}
