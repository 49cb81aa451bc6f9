//! What running one behavior produced.

use std::io;

use specula_core::{ExpectationFailed, Failure};
use thiserror::Error;

/// The single reported result of one behavior execution.
#[derive(Debug)]
pub enum Outcome {
    Passed,
    /// An expectation did not hold. A normal test failure, not a defect.
    Mismatch(ExpectationFailed),
    /// Something else went wrong.
    Error(ExecutionError),
}

impl Outcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    /// Short lowercase label used by reporters.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Passed => "passed",
            Outcome::Mismatch(_) => "mismatch",
            Outcome::Error(_) => "error",
        }
    }
}

/// A non-expectation failure during construction, a lifecycle hook, invocation, verification, or teardown.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// A step returned an error or unwound with a `Failure` payload.
    #[error("{cause}")]
    Raised { cause: Failure },

    /// A step panicked with an ordinary panic payload.
    #[error("panicked: {message}")]
    Panicked { message: String },

    /// Teardown failed while the behavior itself had passed.
    #[error("teardown failed: {cause}")]
    Teardown {
        #[source]
        cause: Box<ExecutionError>,
    },

    /// The dedicated thread for an isolated run could not be started.
    #[error("could not start isolated thread: {source}")]
    Isolation { source: io::Error },

    #[error("`{behavior}` cannot be invoked")]
    NotInvocable { behavior: String },
}

impl ExecutionError {
    /// The original error raised by specification code, when there is one.
    pub fn cause(&self) -> Option<&Failure> {
        match self {
            ExecutionError::Raised { cause } => Some(cause),
            ExecutionError::Teardown { cause } => cause.cause(),
            _ => None,
        }
    }

    pub fn is_teardown(&self) -> bool {
        matches!(self, ExecutionError::Teardown { .. })
    }
}
