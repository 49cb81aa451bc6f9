//! Type-erased subjects shared between the engine, a specification, and its scenarios.
//!
//! The engine owns the [`ContextObject`] for one behavior run. A specification exposes it to scenario
//! code through a [`SubjectSlot`]: the specification binds the object into its slot, and scenarios that
//! cloned the slot in their constructor reach the subject through it.

use std::any::{self, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use crate::failure::Failure;

/// The subject of one behavior run, after the context-object factory has produced it.
///
/// Clones share the same value.
#[derive(Clone)]
pub struct ContextObject {
    value: Arc<Mutex<Box<dyn Any + Send>>>,
    type_name: &'static str,
}

impl ContextObject {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            value: Arc::new(Mutex::new(Box::new(value))),
            type_name: any::type_name::<T>(),
        }
    }

    /// The object used when a scenario declares no subject factory.
    pub fn unit() -> Self {
        Self::new(())
    }

    /// Name of the wrapped type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.lock().is::<T>()
    }

    pub fn is_unit(&self) -> bool {
        self.is::<()>()
    }

    /// Run `f` against the subject if it has type `T`.
    ///
    /// The object stays locked while `f` runs; re-entering the same object from `f` deadlocks.
    pub fn with<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guard = self.lock();
        guard.downcast_mut::<T>().map(f)
    }

    /// Whether two handles refer to the same subject.
    pub fn ptr_eq(&self, other: &ContextObject) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Box<dyn Any + Send>> {
        // A behavior that panicked while holding the lock must not hide the subject from teardown.
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ContextObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextObject").field("type_name", &self.type_name).finish()
    }
}

/// Why a [`SubjectSlot`] could not hand out its subject.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("no context object is bound to this slot")]
    Unbound,
    #[error("context object has type `{actual}`, expected `{expected}`")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

/// A typed, shareable "current subject" slot.
pub struct SubjectSlot<T> {
    cell: Arc<Mutex<Option<ContextObject>>>,
    _subject: PhantomData<fn() -> T>,
}

impl<T: Any> SubjectSlot<T> {
    pub fn new() -> Self {
        Self {
            cell: Arc::new(Mutex::new(None)),
            _subject: PhantomData,
        }
    }

    pub fn bind(&self, object: &ContextObject) {
        *self.lock() = Some(object.clone());
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    pub fn is_bound(&self) -> bool {
        self.lock().is_some()
    }

    /// The bound object, if any.
    pub fn object(&self) -> Option<ContextObject> {
        self.lock().clone()
    }

    /// Run `f` against the bound subject.
    pub fn try_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, SlotError> {
        let object = self.object().ok_or(SlotError::Unbound)?;
        let actual = object.type_name();
        object.with(f).ok_or(SlotError::TypeMismatch {
            expected: any::type_name::<T>(),
            actual,
        })
    }

    /// Run `f` against the bound subject.
    ///
    /// # Panics
    ///
    /// Unwinds with a [`Failure`] wrapping [`SlotError`] when the slot is empty or holds another type; the
    /// engine reports that as an execution error.
    #[track_caller]
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        match self.try_with(f) {
            Ok(value) => value,
            Err(err) => std::panic::resume_unwind(Box::new(Failure::from(err))),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ContextObject>> {
        self.cell.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Any + Clone> SubjectSlot<T> {
    /// A copy of the bound subject.
    pub fn get(&self) -> Result<T, SlotError> {
        self.try_with(|subject| subject.clone())
    }
}

impl<T: Any> Default for SubjectSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SubjectSlot<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            _subject: PhantomData,
        }
    }
}

impl<T> fmt::Debug for SubjectSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubjectSlot")
            .field("subject", &any::type_name::<T>())
            .finish_non_exhaustive()
    }
}
