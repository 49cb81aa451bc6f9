//! Reflective descriptors of a specification's structure.
//!
//! `#[specification]` emits these at build time: one [`TypeDescriptor`] per nested struct or inline module,
//! one [`MethodDescriptor`] per method of an inherent impl, in declaration order. The engine's discoverers
//! decide what qualifies as a scenario or behavior; the descriptors only record what was declared.

use std::any::Any;
use std::fmt;

use crate::failure::Failure;
use crate::spec::Specification;
use crate::subject::ContextObject;

/// Creates a fresh specification value.
pub type SpecConstructor = fn() -> Result<Box<dyn Specification>, Failure>;

/// Creates a scenario instance bound to its owning specification.
pub type ScenarioConstructor = fn(&mut dyn Specification) -> Result<Box<dyn Any>, Failure>;

/// Calls a zero-argument method on a type-erased scenario instance.
pub type MethodFn = fn(&mut dyn Any) -> Result<Returned, Failure>;

/// A process-wide hook on a specification's root type.
pub type HookFn = fn() -> Result<(), Failure>;

/// What a dynamically invoked method produced.
#[derive(Debug)]
pub enum Returned {
    Unit,
    Value(ContextObject),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// `pub`
    Public,
    /// `pub(crate)`, `pub(super)`, `pub(in ..)`
    Restricted,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Receiver {
    /// An associated function.
    None,
    Ref,
    Mut,
    Value,
}

impl Receiver {
    /// Whether the method can be called through a `&mut` to the instance.
    pub fn is_by_reference(self) -> bool {
        matches!(self, Receiver::Ref | Receiver::Mut)
    }
}

/// Shape of a method's return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnKind {
    /// Nothing, or `()`.
    Unit,
    /// `Result<(), E>`
    FallibleUnit,
    Value,
    /// `Result<T, E>` with a non-unit `T`.
    FallibleValue,
}

impl ReturnKind {
    pub fn is_unit(self) -> bool {
        matches!(self, ReturnKind::Unit | ReturnKind::FallibleUnit)
    }
}

#[derive(Clone)]
pub struct MethodDescriptor {
    pub name: &'static str,
    /// Name of the type whose impl declares the method.
    pub declared_on: &'static str,
    pub position: Option<u32>,
    pub visibility: Visibility,
    pub receiver: Receiver,
    /// Parameter count, excluding the receiver.
    pub arity: usize,
    pub returns: ReturnKind,
    /// Marked `#[subject]`.
    pub subject_marker: bool,
    /// Marked `#[disposer]`.
    pub disposer_marker: bool,
    pub invoker: Option<MethodFn>,
}

impl MethodDescriptor {
    /// A public, zero-argument `&mut self` method returning nothing, with no invoker yet.
    pub fn new(name: &'static str, declared_on: &'static str) -> Self {
        Self {
            name,
            declared_on,
            position: None,
            visibility: Visibility::Public,
            receiver: Receiver::Mut,
            arity: 0,
            returns: ReturnKind::Unit,
            subject_marker: false,
            disposer_marker: false,
            invoker: None,
        }
    }

    pub fn with_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_receiver(mut self, receiver: Receiver) -> Self {
        self.receiver = receiver;
        self
    }

    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = arity;
        self
    }

    pub fn with_returns(mut self, returns: ReturnKind) -> Self {
        self.returns = returns;
        self
    }

    pub fn marked_subject(mut self) -> Self {
        self.subject_marker = true;
        self
    }

    pub fn marked_disposer(mut self) -> Self {
        self.disposer_marker = true;
        self
    }

    pub fn with_invoker(mut self, invoker: MethodFn) -> Self {
        self.invoker = Some(invoker);
        self
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("declared_on", &self.declared_on)
            .field("position", &self.position)
            .field("visibility", &self.visibility)
            .field("receiver", &self.receiver)
            .field("arity", &self.arity)
            .field("returns", &self.returns)
            .field("subject_marker", &self.subject_marker)
            .field("disposer_marker", &self.disposer_marker)
            .field("invocable", &self.invoker.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Struct,
    /// An inline module; groups nested scenarios.
    Module,
}

#[derive(Clone)]
pub struct TypeDescriptor {
    pub name: &'static str,
    pub kind: TypeKind,
    pub position: Option<u32>,
    /// Marked `#[ignore]`.
    pub ignored: bool,
    /// Present when the type has a constructor taking its owning specification.
    pub constructor: Option<ScenarioConstructor>,
    pub methods: Vec<MethodDescriptor>,
    pub nested: Vec<TypeDescriptor>,
}

impl TypeDescriptor {
    pub fn structure(name: &'static str) -> Self {
        Self::new(name, TypeKind::Struct)
    }

    pub fn module(name: &'static str) -> Self {
        Self::new(name, TypeKind::Module)
    }

    fn new(name: &'static str, kind: TypeKind) -> Self {
        Self {
            name,
            kind,
            position: None,
            ignored: false,
            constructor: None,
            methods: Vec::new(),
            nested: Vec::new(),
        }
    }

    pub fn with_position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    pub fn ignored(mut self, ignored: bool) -> Self {
        self.ignored = ignored;
        self
    }

    pub fn with_constructor(mut self, constructor: ScenarioConstructor) -> Self {
        self.constructor = Some(constructor);
        self
    }

    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_methods(mut self, methods: impl IntoIterator<Item = MethodDescriptor>) -> Self {
        self.methods.extend(methods);
        self
    }

    pub fn with_nested(mut self, nested: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        self.nested.extend(nested);
        self
    }

    /// Bound to an enclosing specification instance, i.e. not a free-standing helper type.
    pub fn is_enclosing_bound(&self) -> bool {
        self.constructor.is_some()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("position", &self.position)
            .field("ignored", &self.ignored)
            .field("enclosing_bound", &self.constructor.is_some())
            .field("methods", &self.methods)
            .field("nested", &self.nested)
            .finish()
    }
}

/// Everything the engine knows about one specification.
#[derive(Clone)]
pub struct SpecType {
    pub name: &'static str,
    pub constructor: SpecConstructor,
    pub once_before: Option<HookFn>,
    pub once_after: Option<HookFn>,
    /// Nested types in declaration order.
    pub members: Vec<TypeDescriptor>,
}

impl SpecType {
    pub fn new(name: &'static str, constructor: SpecConstructor) -> Self {
        Self {
            name,
            constructor,
            once_before: None,
            once_after: None,
            members: Vec::new(),
        }
    }

    pub fn with_once_before(mut self, hook: HookFn) -> Self {
        self.once_before = Some(hook);
        self
    }

    pub fn with_once_after(mut self, hook: HookFn) -> Self {
        self.once_after = Some(hook);
        self
    }

    pub fn with_members(mut self, members: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        self.members.extend(members);
        self
    }
}

impl fmt::Debug for SpecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecType")
            .field("name", &self.name)
            .field("once_before", &self.once_before.is_some())
            .field("once_after", &self.once_after.is_some())
            .field("members", &self.members)
            .finish()
    }
}

/// Downcast the owning specification inside a generated scenario constructor.
pub fn downcast_spec_mut<S: Specification>(spec: &mut dyn Specification) -> Result<&mut S, Failure> {
    <dyn Specification as crate::spec::AsAny>::as_any_mut(spec)
        .downcast_mut::<S>()
        .ok_or_else(|| Failure::msg(format!("specification is not a `{}`", std::any::type_name::<S>())))
}

/// Downcast a scenario instance inside a generated method invoker.
pub fn downcast_context_mut<C: Any>(context: &mut dyn Any) -> Result<&mut C, Failure> {
    context
        .downcast_mut::<C>()
        .ok_or_else(|| Failure::msg(format!("context is not a `{}`", std::any::type_name::<C>())))
}
