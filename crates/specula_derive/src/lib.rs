//! The `#[specification]` attribute macro.
//!
//! Applied to an inline module, it records the module's structure so the engine can discover scenarios
//! and behaviors at run time without any registration:
//! - every nested struct becomes a `TypeDescriptor` (constructor, methods, `#[ignore]` flag),
//! - every nested inline module becomes a grouping `TypeDescriptor` whose members are described by a
//!   generated `__specula_members()` function inside that module,
//! - the root type's `once_before` / `once_after` associated functions become process-wide hooks.
//!
//! Positions are declaration indices, so the engine's default ordering is source order.
//!
//! # Example
//! ```ignore
//! #[specification]
//! mod stack_spec {
//!     use specula::prelude::*;
//!
//!     #[derive(Default)]
//!     pub struct StackSpec { stack: SubjectSlot<Vec<i32>> }
//!
//!     impl Specification for StackSpec {
//!         fn bind_context_object(&mut self, object: &ContextObject) { self.stack.bind(object) }
//!     }
//!
//!     pub struct EmptyStack { stack: SubjectSlot<Vec<i32>> }
//!
//!     impl EmptyStack {
//!         pub fn new(spec: &mut StackSpec) -> Self { Self { stack: spec.stack.clone() } }
//!         pub fn context(&mut self) -> Vec<i32> { Vec::new() }
//!         pub fn is_empty(&mut self) { self.stack.with(|s| specify(&s.len(), should::equal(0))) }
//!     }
//! }
//!
//! // Generates `pub fn specification() -> specula::SpecType` inside `stack_spec`.
//! ```

use std::collections::HashMap;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{
    Attribute, FnArg, GenericArgument, Ident, ImplItem, ImplItemFn, Item, ItemImpl, ItemMod, PathArguments,
    ReturnType, Type, parse_macro_input, parse_quote,
};

const IGNORE_MARKER: &str = "ignore";
const SUBJECT_MARKER: &str = "subject";
const DISPOSER_MARKER: &str = "disposer";
const SUBJECT_FACTORY_NAME: &str = "context";
const CONSTRUCTOR_NAME: &str = "new";

/// Describe an inline module as a specification.
///
/// The root type is the struct implementing `Specification` inside the module, or the type named in the
/// attribute: `#[specification(StackSpec)]`. It must implement `Default`.
#[proc_macro_attribute]
pub fn specification(args: TokenStream, input: TokenStream) -> TokenStream {
    let root = if args.is_empty() {
        None
    } else {
        Some(parse_macro_input!(args as Ident))
    };
    let module = parse_macro_input!(input as ItemMod);

    match expand(root, module) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(root: Option<Ident>, mut module: ItemMod) -> syn::Result<TokenStream2> {
    let module_ident = module.ident.clone();
    let Some((_, items)) = module.content.as_mut() else {
        return Err(syn::Error::new_spanned(
            &module_ident,
            "#[specification] requires an inline module (`mod name { ... }`)",
        ));
    };

    let root = match root {
        Some(root) => root,
        None => find_root(items, &module_ident)?,
    };

    let scanned = scan_items(items, &root, true)?;
    let members = emit_members(&scanned.members);
    let hooks = emit_hooks(&root, &scanned.root_methods);
    let root_name = root.unraw().to_string();

    items.push(parse_quote! {
        /// Reflective description of this specification, consumed by the runner.
        pub fn specification() -> ::specula::SpecType {
            ::specula::SpecType::new(#root_name, || -> ::core::result::Result<
                ::std::boxed::Box<dyn ::specula::Specification>,
                ::specula::Failure,
            > {
                ::core::result::Result::Ok(::std::boxed::Box::new(
                    <#root as ::core::default::Default>::default(),
                ) as ::std::boxed::Box<dyn ::specula::Specification>)
            })
            #hooks
            .with_members(#members)
        }
    });

    Ok(quote!(#module))
}

/// The struct with an `impl ... Specification for X` block in this module.
fn find_root(items: &[Item], module_ident: &Ident) -> syn::Result<Ident> {
    let mut roots = items.iter().filter_map(|item| match item {
        Item::Impl(imp) => {
            let (_, path, _) = imp.trait_.as_ref()?;
            let is_spec = path.segments.last().is_some_and(|s| s.ident == "Specification");
            if is_spec { simple_self_ident(imp) } else { None }
        }
        _ => None,
    });

    match (roots.next(), roots.next()) {
        (Some(root), None) => Ok(root),
        (None, _) => Err(syn::Error::new_spanned(
            module_ident,
            "no specification root found: implement `Specification` for a struct in this module, \
             or name the root type with #[specification(RootType)]",
        )),
        (Some(_), Some(second)) => Err(syn::Error::new_spanned(
            second,
            "more than one type implements `Specification` in this module; \
             name the root type with #[specification(RootType)]",
        )),
    }
}

// ============================================================================
// Scanning
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum Shape {
    Unit,
    FallibleUnit,
    Value,
    FallibleValue,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Recv {
    None,
    Ref,
    Mut,
    Value,
}

#[derive(Clone, Copy)]
enum Vis {
    Public,
    Restricted,
    Private,
}

struct MethodModel {
    ident: Ident,
    position: u32,
    vis: Vis,
    receiver: Recv,
    arity: usize,
    returns: Shape,
    subject_marker: bool,
    disposer_marker: bool,
    /// Free of generics, `async`, `unsafe`, and variadics.
    plain: bool,
}

impl MethodModel {
    fn is_subject_candidate(&self) -> bool {
        self.subject_marker || self.ident == SUBJECT_FACTORY_NAME
    }

    fn is_invocable(&self) -> bool {
        if !self.plain || self.arity != 0 || !matches!(self.receiver, Recv::Ref | Recv::Mut) {
            return false;
        }
        match self.returns {
            Shape::Unit | Shape::FallibleUnit => true,
            Shape::Value | Shape::FallibleValue => self.is_subject_candidate(),
        }
    }
}

struct Constructor {
    spec_ty: Type,
    returns: Shape,
}

struct StructModel {
    ident: Ident,
    position: u32,
    ignored: bool,
    generic: bool,
    constructor: Option<Constructor>,
    methods: Vec<MethodModel>,
}

struct ModuleModel {
    ident: Ident,
    position: u32,
    ignored: bool,
}

enum Member {
    Struct(StructModel),
    Module(ModuleModel),
}

struct Scanned {
    members: Vec<Member>,
    root_methods: Vec<MethodModel>,
}

/// Record the structure of `items`, strip marker attributes, and describe nested inline modules in place.
///
/// `top_level` is set for the specification module itself, where the root struct lives.
fn scan_items(items: &mut Vec<Item>, root: &Ident, top_level: bool) -> syn::Result<Scanned> {
    let mut members = Vec::new();
    let mut struct_index: HashMap<String, usize> = HashMap::new();

    for (index, item) in items.iter_mut().enumerate() {
        let position = u32::try_from(index).unwrap_or(u32::MAX);
        match item {
            Item::Struct(s) => {
                let ignored = take_marker(&mut s.attrs, IGNORE_MARKER);
                if top_level && *root == s.ident {
                    continue;
                }
                struct_index.insert(s.ident.to_string(), members.len());
                members.push(Member::Struct(StructModel {
                    ident: s.ident.clone(),
                    position,
                    ignored,
                    generic: !s.generics.params.is_empty(),
                    constructor: None,
                    methods: Vec::new(),
                }));
            }
            Item::Mod(m) => {
                let ignored = take_marker(&mut m.attrs, IGNORE_MARKER);
                let Some((_, nested_items)) = m.content.as_mut() else {
                    continue;
                };
                let nested = scan_items(nested_items, root, false)?;
                let nested_members = emit_members(&nested.members);
                nested_items.push(parse_quote! {
                    #[doc(hidden)]
                    pub(super) fn __specula_members() -> ::std::vec::Vec<::specula::__private::TypeDescriptor> {
                        #nested_members
                    }
                });
                members.push(Member::Module(ModuleModel {
                    ident: m.ident.clone(),
                    position,
                    ignored,
                }));
            }
            _ => {}
        }
    }

    let mut root_methods = Vec::new();
    let mut method_positions: HashMap<String, u32> = HashMap::new();

    for item in items.iter_mut() {
        let Item::Impl(imp) = item else {
            continue;
        };
        if imp.trait_.is_some() || !imp.generics.params.is_empty() {
            continue;
        }
        let Some(self_ident) = simple_self_ident(imp) else {
            continue;
        };
        let key = self_ident.to_string();
        let counter = method_positions.entry(key.clone()).or_insert(0);
        let methods = scan_impl(imp, counter);

        if top_level && *root == self_ident {
            root_methods.extend(methods);
            continue;
        }
        let Some(&slot) = struct_index.get(&key) else {
            continue;
        };
        let Member::Struct(model) = &mut members[slot] else {
            continue;
        };
        for method in methods {
            if let Some(ctor) = constructor_of(imp, &method, root) {
                model.constructor.get_or_insert(ctor);
            }
            model.methods.push(method);
        }
    }

    Ok(Scanned { members, root_methods })
}

fn scan_impl(imp: &mut ItemImpl, counter: &mut u32) -> Vec<MethodModel> {
    let mut methods = Vec::new();
    for impl_item in imp.items.iter_mut() {
        let ImplItem::Fn(f) = impl_item else {
            continue;
        };
        let subject_marker = take_marker(&mut f.attrs, SUBJECT_MARKER);
        let disposer_marker = take_marker(&mut f.attrs, DISPOSER_MARKER);
        methods.push(MethodModel {
            ident: f.sig.ident.clone(),
            position: *counter,
            vis: visibility_of(&f.vis),
            receiver: receiver_of(f),
            arity: f.sig.inputs.iter().filter(|arg| matches!(arg, FnArg::Typed(_))).count(),
            returns: shape_of_return(&f.sig.output),
            subject_marker,
            disposer_marker,
            plain: f.sig.generics.params.is_empty()
                && f.sig.asyncness.is_none()
                && f.sig.unsafety.is_none()
                && f.sig.variadic.is_none(),
        });
        *counter += 1;
    }
    methods
}

/// `fn new(spec: &Spec)` or `fn new(spec: &mut Spec)`, returning `Self` or a `Result` of it.
///
/// `Spec` must name the root type, directly or through a path such as `super::Spec`. Any other `new`
/// belongs to a helper type.
fn constructor_of(imp: &ItemImpl, method: &MethodModel, root: &Ident) -> Option<Constructor> {
    if method.ident != CONSTRUCTOR_NAME || method.receiver != Recv::None || !method.plain {
        return None;
    }
    let f = imp.items.iter().find_map(|item| match item {
        ImplItem::Fn(f) if f.sig.ident == method.ident => Some(f),
        _ => None,
    })?;
    let mut typed = f.sig.inputs.iter().filter_map(|arg| match arg {
        FnArg::Typed(pat) => Some(pat),
        FnArg::Receiver(_) => None,
    });
    let (Some(param), None) = (typed.next(), typed.next()) else {
        return None;
    };
    let Type::Reference(reference) = &*param.ty else {
        return None;
    };
    if !names_root(&reference.elem, root) {
        return None;
    }
    let returns = match method.returns {
        Shape::FallibleValue | Shape::FallibleUnit => Shape::FallibleValue,
        _ => Shape::Value,
    };
    Some(Constructor {
        spec_ty: (*reference.elem).clone(),
        returns,
    })
}

fn names_root(ty: &Type, root: &Ident) -> bool {
    match ty {
        Type::Paren(paren) => names_root(&paren.elem, root),
        Type::Group(group) => names_root(&group.elem, root),
        Type::Path(path) if path.qself.is_none() => path
            .path
            .segments
            .last()
            .is_some_and(|last| last.ident == *root && matches!(last.arguments, PathArguments::None)),
        _ => false,
    }
}

fn simple_self_ident(imp: &ItemImpl) -> Option<Ident> {
    let Type::Path(path) = &*imp.self_ty else {
        return None;
    };
    if path.qself.is_some() || path.path.segments.len() != 1 {
        return None;
    }
    let segment = path.path.segments.first()?;
    if !matches!(segment.arguments, PathArguments::None) {
        return None;
    }
    Some(segment.ident.clone())
}

/// Remove every `#[name]` attribute, reporting whether one was present.
fn take_marker(attrs: &mut Vec<Attribute>, name: &str) -> bool {
    let before = attrs.len();
    attrs.retain(|attr| !attr.path().is_ident(name));
    attrs.len() != before
}

fn visibility_of(vis: &syn::Visibility) -> Vis {
    match vis {
        syn::Visibility::Public(_) => Vis::Public,
        syn::Visibility::Restricted(_) => Vis::Restricted,
        syn::Visibility::Inherited => Vis::Private,
    }
}

fn receiver_of(f: &ImplItemFn) -> Recv {
    let Some(receiver) = f.sig.receiver() else {
        return Recv::None;
    };
    match &*receiver.ty {
        Type::Reference(reference) if reference.mutability.is_some() => Recv::Mut,
        Type::Reference(_) => Recv::Ref,
        _ => Recv::Value,
    }
}

fn shape_of_return(output: &ReturnType) -> Shape {
    match output {
        ReturnType::Default => Shape::Unit,
        ReturnType::Type(_, ty) => shape_of(ty),
    }
}

fn shape_of(ty: &Type) -> Shape {
    match ty {
        Type::Tuple(tuple) if tuple.elems.is_empty() => Shape::Unit,
        Type::Paren(paren) => shape_of(&paren.elem),
        Type::Group(group) => shape_of(&group.elem),
        Type::Path(path) if path.qself.is_none() => {
            let Some(last) = path.path.segments.last() else {
                return Shape::Value;
            };
            if last.ident != "Result" {
                return Shape::Value;
            }
            let PathArguments::AngleBracketed(args) = &last.arguments else {
                return Shape::FallibleValue;
            };
            match args.args.first() {
                Some(GenericArgument::Type(ok)) if shape_of(ok) == Shape::Unit => Shape::FallibleUnit,
                _ => Shape::FallibleValue,
            }
        }
        _ => Shape::Value,
    }
}

// ============================================================================
// Emission
// ============================================================================

fn emit_members(members: &[Member]) -> TokenStream2 {
    let entries = members.iter().map(|member| match member {
        Member::Struct(model) => emit_struct(model),
        Member::Module(model) => emit_module(model),
    });
    quote! {
        ::std::vec![#(#entries),*]
    }
}

fn emit_module(model: &ModuleModel) -> TokenStream2 {
    let ident = &model.ident;
    let name = ident.unraw().to_string();
    let position = model.position;
    let ignored = model.ignored;
    quote! {
        ::specula::__private::TypeDescriptor::module(#name)
            .with_position(#position)
            .ignored(#ignored)
            .with_nested(self::#ident::__specula_members())
    }
}

fn emit_struct(model: &StructModel) -> TokenStream2 {
    let ident = &model.ident;
    let name = ident.unraw().to_string();
    let position = model.position;
    let ignored = model.ignored;

    let constructor = match (&model.constructor, model.generic) {
        (Some(ctor), false) => emit_constructor(ident, ctor),
        _ => quote!(),
    };
    let methods = model.methods.iter().map(|method| emit_method(ident, &name, method, !model.generic));

    quote! {
        ::specula::__private::TypeDescriptor::structure(#name)
            .with_position(#position)
            .ignored(#ignored)
            #constructor
            .with_methods(::std::vec![#(#methods),*])
    }
}

fn emit_constructor(ident: &Ident, ctor: &Constructor) -> TokenStream2 {
    let spec_ty = &ctor.spec_ty;
    let build = match ctor.returns {
        Shape::FallibleValue => quote! {
            let __scenario = ::core::result::Result::map_err(
                #ident::new(__spec),
                ::core::convert::Into::<::specula::Failure>::into,
            )?;
        },
        _ => quote! {
            let __scenario = #ident::new(__spec);
        },
    };
    quote! {
        .with_constructor(|__spec: &mut dyn ::specula::Specification| -> ::core::result::Result<
            ::std::boxed::Box<dyn ::core::any::Any>,
            ::specula::Failure,
        > {
            let __spec = ::specula::__private::downcast_spec_mut::<#spec_ty>(__spec)?;
            #build
            ::core::result::Result::Ok(::std::boxed::Box::new(__scenario) as ::std::boxed::Box<dyn ::core::any::Any>)
        })
    }
}

fn emit_method(owner: &Ident, owner_name: &str, method: &MethodModel, callable: bool) -> TokenStream2 {
    let name = method.ident.unraw().to_string();
    let position = method.position;
    let arity = method.arity;
    let visibility = match method.vis {
        Vis::Public => quote!(::specula::__private::Visibility::Public),
        Vis::Restricted => quote!(::specula::__private::Visibility::Restricted),
        Vis::Private => quote!(::specula::__private::Visibility::Private),
    };
    let receiver = match method.receiver {
        Recv::None => quote!(::specula::__private::Receiver::None),
        Recv::Ref => quote!(::specula::__private::Receiver::Ref),
        Recv::Mut => quote!(::specula::__private::Receiver::Mut),
        Recv::Value => quote!(::specula::__private::Receiver::Value),
    };
    let returns = match method.returns {
        Shape::Unit => quote!(::specula::__private::ReturnKind::Unit),
        Shape::FallibleUnit => quote!(::specula::__private::ReturnKind::FallibleUnit),
        Shape::Value => quote!(::specula::__private::ReturnKind::Value),
        Shape::FallibleValue => quote!(::specula::__private::ReturnKind::FallibleValue),
    };
    let subject = method.subject_marker.then(|| quote!(.marked_subject()));
    let disposer = method.disposer_marker.then(|| quote!(.marked_disposer()));
    let invoker = (callable && method.is_invocable()).then(|| emit_invoker(owner, method));

    quote! {
        ::specula::__private::MethodDescriptor::new(#name, #owner_name)
            .with_position(#position)
            .with_visibility(#visibility)
            .with_receiver(#receiver)
            .with_arity(#arity)
            .with_returns(#returns)
            #subject
            #disposer
            #invoker
    }
}

fn emit_invoker(owner: &Ident, method: &MethodModel) -> TokenStream2 {
    let name = &method.ident;
    let body = match method.returns {
        Shape::Unit => quote! {
            __ctx.#name();
            ::core::result::Result::Ok(::specula::__private::Returned::Unit)
        },
        Shape::FallibleUnit => quote! {
            ::core::result::Result::map_err(__ctx.#name(), ::core::convert::Into::<::specula::Failure>::into)?;
            ::core::result::Result::Ok(::specula::__private::Returned::Unit)
        },
        Shape::Value => quote! {
            let __subject = __ctx.#name();
            ::core::result::Result::Ok(::specula::__private::Returned::Value(
                ::specula::__private::ContextObject::new(__subject),
            ))
        },
        Shape::FallibleValue => quote! {
            let __subject = ::core::result::Result::map_err(
                __ctx.#name(),
                ::core::convert::Into::<::specula::Failure>::into,
            )?;
            ::core::result::Result::Ok(::specula::__private::Returned::Value(
                ::specula::__private::ContextObject::new(__subject),
            ))
        },
    };
    quote! {
        .with_invoker(|__ctx: &mut dyn ::core::any::Any| -> ::core::result::Result<
            ::specula::__private::Returned,
            ::specula::Failure,
        > {
            let __ctx = ::specula::__private::downcast_context_mut::<#owner>(__ctx)?;
            #body
        })
    }
}

fn emit_hooks(root: &Ident, methods: &[MethodModel]) -> TokenStream2 {
    let hook = |name: &str, builder: TokenStream2| {
        let method = methods.iter().find(|m| {
            m.ident == name
                && matches!(m.vis, Vis::Public)
                && m.receiver == Recv::None
                && m.arity == 0
                && m.plain
                && matches!(m.returns, Shape::Unit | Shape::FallibleUnit)
        })?;
        let ident = &method.ident;
        let call = if method.returns == Shape::FallibleUnit {
            quote! {
                ::core::result::Result::map_err(#root::#ident(), ::core::convert::Into::<::specula::Failure>::into)
            }
        } else {
            quote! {{
                #root::#ident();
                ::core::result::Result::Ok(())
            }}
        };
        Some(quote! {
            .#builder(|| -> ::core::result::Result<(), ::specula::Failure> { #call })
        })
    };
    let before = hook("once_before", quote!(with_once_before));
    let after = hook("once_after", quote!(with_once_after));
    quote!(#before #after)
}
