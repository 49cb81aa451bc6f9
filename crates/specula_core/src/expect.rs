//! Expectation evaluator.
//!
//! Behaviors state what they expect with [`specify`]. A mismatch raises an [`ExpectationFailed`] signal
//! that the engine can tell apart from every other error by type alone, never by message text.
//!
//! Mismatches unwind through [`std::panic::resume_unwind`], which skips the process panic hook: a
//! failed expectation is an ordinary outcome and should not print a panic banner.

use std::any::Any;
use std::fmt::{self, Debug};
use std::panic::{self, Location, UnwindSafe};

use crate::failure::Failure;

/// The distinguished "the expected outcome did not hold" signal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ExpectationFailed {
    message: String,
    location: Option<String>,
}

impl ExpectationFailed {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Attach the source location the expectation was stated at.
    pub fn at(mut self, location: &Location<'_>) -> Self {
        self.location = Some(format!("{}:{}", location.file(), location.line()));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// `file:line` of the failed expectation, when known.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Unwind with this mismatch as the payload.
    pub fn raise(self) -> ! {
        panic::resume_unwind(Box::new(self))
    }
}

/// Result of evaluating one expectation.
#[derive(Debug)]
pub enum Verdict {
    /// The expectation holds.
    Pass,
    /// The expectation does not hold; carries a human-readable explanation.
    Fail(String),
    /// The expectation could not be evaluated at all.
    Error(Failure),
}

/// A predicate over an actual value.
pub trait Expectation<T: ?Sized> {
    fn evaluate(&self, actual: &T) -> Verdict;
}

impl<T: ?Sized, F> Expectation<T> for F
where
    F: Fn(&T) -> Verdict,
{
    fn evaluate(&self, actual: &T) -> Verdict {
        self(actual)
    }
}

/// State an expectation about `actual`.
///
/// # Panics
///
/// Unwinds with [`ExpectationFailed`] when the expectation does not hold, or with the evaluator's
/// [`Failure`] when it could not be evaluated.
#[track_caller]
pub fn specify<T: ?Sized>(actual: &T, expectation: impl Expectation<T>) {
    match expectation.evaluate(actual) {
        Verdict::Pass => {}
        Verdict::Fail(explanation) => ExpectationFailed::new(explanation).at(Location::caller()).raise(),
        Verdict::Error(failure) => panic::resume_unwind(Box::new(failure)),
    }
}

/// State that `condition` holds.
///
/// # Panics
///
/// Unwinds with [`ExpectationFailed`] carrying `message` when `condition` is false.
#[track_caller]
pub fn specify_that(condition: bool, message: impl fmt::Display) {
    if !condition {
        ExpectationFailed::new(message.to_string()).at(Location::caller()).raise();
    }
}

/// State that `block` panics, optionally with exactly `message`.
///
/// # Panics
///
/// Unwinds with [`ExpectationFailed`] when the block completes normally or panics with a different message.
#[track_caller]
pub fn specify_panics<F>(block: F, message: Option<&str>)
where
    F: FnOnce() + UnwindSafe,
{
    let location = Location::caller();
    let payload = match panic::catch_unwind(block) {
        Ok(()) => ExpectationFailed::new("The specified block should panic, but it completed normally.")
            .at(location)
            .raise(),
        Err(payload) => payload,
    };
    let Some(expected) = message else {
        return;
    };
    let actual = payload_message(payload.as_ref());
    if actual.as_deref() != Some(expected) {
        let shown = actual.unwrap_or_else(|| "<non-string payload>".to_string());
        ExpectationFailed::new(format!(
            "Expected the panic message to be \"{expected}\", but was: \"{shown}\"."
        ))
        .at(location)
        .raise();
    }
}

/// Best-effort text of a panic payload.
pub fn payload_message(payload: &(dyn Any + Send)) -> Option<String> {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        Some((*s).to_string())
    } else if let Some(s) = payload.downcast_ref::<String>() {
        Some(s.clone())
    } else if let Some(f) = payload.downcast_ref::<ExpectationFailed>() {
        Some(f.message().to_string())
    } else {
        payload.downcast_ref::<Failure>().map(|f| f.to_string())
    }
}

/// Stock expectations.
pub mod should {
    use super::*;

    /// Actual must equal `expected`.
    pub fn equal<T: PartialEq + Debug>(expected: T) -> impl Expectation<T> {
        move |actual: &T| {
            if *actual == expected {
                Verdict::Pass
            } else {
                Verdict::Fail(format!("Expected: {expected:?}, but was: {actual:?}"))
            }
        }
    }

    /// Actual must differ from `unexpected`.
    pub fn not_equal<T: PartialEq + Debug>(unexpected: T) -> impl Expectation<T> {
        move |actual: &T| {
            if *actual != unexpected {
                Verdict::Pass
            } else {
                Verdict::Fail(format!("Did not expect: {actual:?}"))
            }
        }
    }

    /// Actual must satisfy `predicate`, described as `description` in the mismatch text.
    pub fn satisfy<T: Debug + ?Sized, P>(description: &'static str, predicate: P) -> impl Expectation<T>
    where
        P: Fn(&T) -> bool,
    {
        move |actual: &T| {
            if predicate(actual) {
                Verdict::Pass
            } else {
                Verdict::Fail(format!("Expected {description}, but was: {actual:?}"))
            }
        }
    }
}
