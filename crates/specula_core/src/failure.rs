//! Failure signals raised by specification code.
//!
//! A [`Failure`] is what a lifecycle step returns when it does not complete. It is an opaque, boxed
//! error so that specification code can use `?` on any `std::error::Error`. `Failure` deliberately does
//! not implement `Error` itself, which keeps the blanket `From<E: Error>` conversion coherent.

use std::error::Error;
use std::fmt;

use crate::expect::ExpectationFailed;

type BoxedError = Box<dyn Error + Send + Sync + 'static>;

/// An error raised by a behavior, a lifecycle hook, or a scenario constructor.
pub struct Failure {
    inner: BoxedError,
}

impl Failure {
    /// Create a failure carrying only a message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self {
            inner: Box::new(MessageError(message.to_string())),
        }
    }

    /// Wrap an already boxed error.
    pub fn from_boxed(inner: BoxedError) -> Self {
        Self { inner }
    }

    /// Borrow the underlying error.
    pub fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.inner
    }

    /// Consume the failure, returning the underlying error.
    pub fn into_boxed(self) -> BoxedError {
        self.inner
    }

    /// Attempt to view the underlying error as a concrete type.
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    /// The expectation mismatch this failure is, or directly wraps.
    ///
    /// Only the immediate `source()` is inspected; deeper chains are treated as ordinary errors.
    pub fn expectation(&self) -> Option<&ExpectationFailed> {
        self.inner
            .downcast_ref::<ExpectationFailed>()
            .or_else(|| self.inner.source().and_then(|s| s.downcast_ref::<ExpectationFailed>()))
    }

    /// Strip one [`InvocationError`] layer, if present.
    pub fn unwrap_invocation(self) -> Failure {
        match self.inner.downcast::<InvocationError>() {
            Ok(invocation) => invocation.cause,
            Err(inner) => Failure { inner },
        }
    }
}

impl<E> From<E> for Failure
where
    E: Error + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self { inner: Box::new(err) }
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

/// A plain message error, produced by [`Failure::msg`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MessageError(pub String);

/// Wrapper added by a dynamic invocation layer around the failure of the method it called.
///
/// The engine unwraps exactly one of these before classifying an outcome, so hosts that wrap behavior
/// invocation (rules, around-advice) do not change how failures are reported.
#[derive(Debug)]
pub struct InvocationError {
    /// Name of the invoked method.
    pub method: String,
    /// What the method raised.
    pub cause: Failure,
}

impl InvocationError {
    pub fn new(method: impl Into<String>, cause: Failure) -> Self {
        Self {
            method: method.into(),
            cause,
        }
    }
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invocation of `{}` failed: {}", self.method, self.cause)
    }
}

impl Error for InvocationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.cause.as_error())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("wrapped: {inner}")]
    struct Wrapper {
        #[source]
        inner: ExpectationFailed,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("outer")]
    struct Outer {
        #[source]
        inner: Wrapper,
    }

    #[test]
    fn test_msg_displays_message() {
        let failure = Failure::msg("disk on fire");
        assert_eq!(failure.to_string(), "disk on fire");
        assert!(failure.downcast_ref::<MessageError>().is_some());
    }

    #[test]
    fn test_expectation_found_directly() {
        let failure = Failure::from(ExpectationFailed::new("expected 1, got 2"));
        assert_eq!(failure.expectation().unwrap().message(), "expected 1, got 2");
    }

    #[test]
    fn test_expectation_found_one_level_down() {
        let failure = Failure::from(Wrapper {
            inner: ExpectationFailed::new("nope"),
        });
        assert!(failure.expectation().is_some());
    }

    #[test]
    fn test_expectation_not_searched_past_immediate_source() {
        let failure = Failure::from(Outer {
            inner: Wrapper {
                inner: ExpectationFailed::new("deep"),
            },
        });
        assert!(failure.expectation().is_none());
    }

    #[test]
    fn test_unwrap_invocation_strips_one_layer() {
        let inner = Failure::msg("boom");
        let wrapped = Failure::from(InvocationError::new("pushes", inner));
        let twice = Failure::from(InvocationError::new("outer", wrapped));

        let once = twice.unwrap_invocation();
        assert!(once.downcast_ref::<InvocationError>().is_some());
        let bare = once.unwrap_invocation();
        assert_eq!(bare.to_string(), "boom");
    }

    #[test]
    fn test_unwrap_invocation_leaves_other_errors() {
        let failure = Failure::msg("plain").unwrap_invocation();
        assert_eq!(failure.to_string(), "plain");
    }

    #[test]
    fn test_invocation_error_source_is_cause() {
        let err = InvocationError::new("is_empty", Failure::msg("inner"));
        assert_eq!(err.source().unwrap().to_string(), "inner");
        assert_eq!(err.to_string(), "invocation of `is_empty` failed: inner");
    }
}
