//! The capability surface a specification offers to the engine.
//!
//! One specification value is created per behavior run and dropped when that run is over. Everything
//! here has a sensible default, so a specification only overrides what it needs.

use std::any::Any;
use std::sync::Arc;

use crate::descriptor::{MethodFn, Returned};
use crate::failure::Failure;
use crate::subject::ContextObject;

/// Upcast helper so the engine can hand a `&mut dyn Specification` to code that expects a concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Root type of a family of scenarios.
pub trait Specification: AsAny + Send + 'static {
    /// Per-behavior setup, run before the scenario is instantiated.
    fn create(&mut self) -> Result<(), Failure> {
        Ok(())
    }

    /// Per-behavior teardown, run last.
    fn destroy(&mut self) -> Result<(), Failure> {
        Ok(())
    }

    /// Run each behavior on a dedicated thread.
    ///
    /// This isolates thread-local state only; process-wide statics are still shared.
    fn needs_thread_isolation(&self) -> bool {
        false
    }

    fn context_object_factory(&self) -> Arc<dyn ContextObjectFactory> {
        Arc::new(DefaultContextObjectFactory)
    }

    /// Verify mock expectations after the behavior ran.
    fn verify_mocks(&mut self) -> Result<(), Failure> {
        Ok(())
    }

    /// Expose the current context object, usually by forwarding to a [`SubjectSlot`](crate::SubjectSlot).
    fn bind_context_object(&mut self, _object: &ContextObject) {}

    fn lifecycle_listeners(&self) -> Vec<Arc<dyn LifecycleListener>> {
        Vec::new()
    }

    fn fire_after_context_instantiation(&mut self, context: &mut dyn Any) -> Result<(), Failure> {
        for listener in self.lifecycle_listeners() {
            listener.after_context_instantiation(context)?;
        }
        Ok(())
    }

    fn fire_after_context_creation(
        &mut self,
        context: &mut dyn Any,
        context_object: &ContextObject,
    ) -> Result<(), Failure> {
        for listener in self.lifecycle_listeners() {
            listener.after_context_creation(context, context_object)?;
        }
        Ok(())
    }

    /// `context` is `None` when the scenario was never instantiated.
    fn fire_after_context_destroy(&mut self, mut context: Option<&mut dyn Any>) -> Result<(), Failure> {
        for listener in self.lifecycle_listeners() {
            listener.after_context_destroy(context.as_deref_mut())?;
        }
        Ok(())
    }
}

/// Observer of context construction and destruction.
pub trait LifecycleListener: Send + Sync {
    fn after_context_instantiation(&self, _context: &mut dyn Any) -> Result<(), Failure> {
        Ok(())
    }

    fn after_context_creation(&self, _context: &mut dyn Any, _context_object: &ContextObject) -> Result<(), Failure> {
        Ok(())
    }

    fn after_context_destroy(&self, _context: Option<&mut dyn Any>) -> Result<(), Failure> {
        Ok(())
    }
}

/// A freshly instantiated scenario, as seen by a [`ContextObjectFactory`].
pub struct ContextHandle<'a> {
    scenario: &'a str,
    instance: &'a mut dyn Any,
    subject_factory: Option<MethodFn>,
}

impl<'a> ContextHandle<'a> {
    pub fn new(scenario: &'a str, instance: &'a mut dyn Any, subject_factory: Option<MethodFn>) -> Self {
        Self {
            scenario,
            instance,
            subject_factory,
        }
    }

    pub fn scenario(&self) -> &str {
        self.scenario
    }

    pub fn instance(&mut self) -> &mut dyn Any {
        &mut *self.instance
    }

    pub fn has_subject_factory(&self) -> bool {
        self.subject_factory.is_some()
    }

    /// Invoke the scenario's subject factory; `None` when it has none.
    pub fn create_subject(&mut self) -> Result<Option<ContextObject>, Failure> {
        let Some(factory) = self.subject_factory else {
            return Ok(None);
        };
        match factory(&mut *self.instance)? {
            Returned::Value(object) => Ok(Some(object)),
            Returned::Unit => Ok(None),
        }
    }
}

/// Turns an instantiated scenario into the object exposed to expectations.
pub trait ContextObjectFactory: Send + Sync {
    fn new_context_object(&self, context: &mut ContextHandle<'_>) -> Result<ContextObject, Failure>;
}

/// Uses the subject factory's result as is, or a unit object when there is no factory.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContextObjectFactory;

impl ContextObjectFactory for DefaultContextObjectFactory {
    fn new_context_object(&self, context: &mut ContextHandle<'_>) -> Result<ContextObject, Failure> {
        Ok(context.create_subject()?.unwrap_or_else(ContextObject::unit))
    }
}
