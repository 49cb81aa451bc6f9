//! Catching what a lifecycle step raised and sorting it into an outcome.
//!
//! A step "raises" by returning `Err(Failure)` or by unwinding. [`guarded`] turns both into a [`Raised`]
//! value; [`classify`] decides whether that is an expectation mismatch or an execution error. The mismatch
//! signal is recognised by type: an [`ExpectationFailed`] payload, a failure that is one, or a failure whose
//! immediate source is one. A single [`specula_core::InvocationError`] layer is unwrapped first.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use specula_core::expect::payload_message;
use specula_core::{ExpectationFailed, Failure};

use super::outcome::{ExecutionError, Outcome};

/// A signal raised by one step of the run protocol.
pub enum Raised {
    Returned(Failure),
    Panicked(Box<dyn Any + Send>),
}

impl fmt::Debug for Raised {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Raised::Returned(failure) => f.debug_tuple("Returned").field(failure).finish(),
            Raised::Panicked(payload) => f.debug_tuple("Panicked").field(&payload_message(payload.as_ref())).finish(),
        }
    }
}

impl fmt::Display for Raised {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Raised::Returned(failure) => write!(f, "{failure}"),
            Raised::Panicked(payload) => match payload_message(payload.as_ref()) {
                Some(message) => write!(f, "panicked: {message}"),
                None => f.write_str("panicked with a non-string payload"),
            },
        }
    }
}

/// Run one step, catching both returned failures and unwinding.
pub fn guarded<T>(step: impl FnOnce() -> Result<T, Failure>) -> Result<T, Raised> {
    match panic::catch_unwind(AssertUnwindSafe(step)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(failure)) => Err(Raised::Returned(failure)),
        Err(payload) => Err(Raised::Panicked(payload)),
    }
}

/// A non-passing outcome.
#[derive(Debug)]
pub enum Classified {
    Mismatch(ExpectationFailed),
    Error(ExecutionError),
}

impl Classified {
    /// Collapse into an execution error, keeping a mismatch as the raised cause.
    pub fn into_error(self) -> ExecutionError {
        match self {
            Classified::Mismatch(mismatch) => ExecutionError::Raised { cause: mismatch.into() },
            Classified::Error(error) => error,
        }
    }
}

impl From<Classified> for Outcome {
    fn from(classified: Classified) -> Self {
        match classified {
            Classified::Mismatch(mismatch) => Outcome::Mismatch(mismatch),
            Classified::Error(error) => Outcome::Error(error),
        }
    }
}

pub fn classify(raised: Raised) -> Classified {
    match raised {
        Raised::Returned(failure) => classify_failure(failure),
        Raised::Panicked(payload) => classify_panic(payload),
    }
}

fn classify_failure(failure: Failure) -> Classified {
    let failure = failure.unwrap_invocation();
    match failure.expectation() {
        Some(mismatch) => Classified::Mismatch(mismatch.clone()),
        None => Classified::Error(ExecutionError::Raised { cause: failure }),
    }
}

fn classify_panic(payload: Box<dyn Any + Send>) -> Classified {
    let payload = match payload.downcast::<ExpectationFailed>() {
        Ok(mismatch) => return Classified::Mismatch(*mismatch),
        Err(payload) => payload,
    };
    match payload.downcast::<Failure>() {
        Ok(failure) => classify_failure(*failure),
        Err(payload) => Classified::Error(ExecutionError::Panicked {
            message: payload_message(payload.as_ref()).unwrap_or_else(|| "non-string panic payload".to_string()),
        }),
    }
}
