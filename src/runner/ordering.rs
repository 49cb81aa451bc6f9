//! Member ordering service.
//!
//! Discovery asks a [`MemberOrdering`] for the order of a type's nested types and methods. An ordering that
//! cannot decide returns `None`; discovery then keeps the order the members were enumerated in. A result
//! that is not a permutation of the input is rejected the same way, so a faulty ordering never loses or
//! duplicates members.

use std::fmt;

use specula_core::{MethodDescriptor, TypeDescriptor};

/// A member with a name and, when known, a declared position.
pub trait Ordered {
    fn name(&self) -> &str;
    fn position(&self) -> Option<u32>;
}

impl Ordered for TypeDescriptor {
    fn name(&self) -> &str {
        self.name
    }

    fn position(&self) -> Option<u32> {
        self.position
    }
}

impl Ordered for MethodDescriptor {
    fn name(&self) -> &str {
        self.name
    }

    fn position(&self) -> Option<u32> {
        self.position
    }
}

/// Decides the order of the members of `owner`.
pub trait MemberOrdering: fmt::Debug + Send + Sync {
    /// Indices into `members` in the order they should run, or `None` when the order cannot be resolved.
    fn order(&self, owner: &str, members: &[&dyn Ordered]) -> Option<Vec<usize>>;
}

/// Source declaration order. Unresolved when any member has no recorded position.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclarationOrder;

impl MemberOrdering for DeclarationOrder {
    fn order(&self, _owner: &str, members: &[&dyn Ordered]) -> Option<Vec<usize>> {
        let positions = members.iter().map(|m| m.position()).collect::<Option<Vec<u32>>>()?;
        let mut indices: Vec<usize> = (0..members.len()).collect();
        indices.sort_by_key(|&i| positions[i]);
        Some(indices)
    }
}

/// Alphabetical by member name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameOrder;

impl MemberOrdering for NameOrder {
    fn order(&self, _owner: &str, members: &[&dyn Ordered]) -> Option<Vec<usize>> {
        let mut indices: Vec<usize> = (0..members.len()).collect();
        indices.sort_by(|&a, &b| members[a].name().cmp(members[b].name()));
        Some(indices)
    }
}

/// Apply `ordering` to `members`, falling back to enumeration order.
pub fn sorted<'a, T: Ordered>(ordering: &dyn MemberOrdering, owner: &str, members: &'a [T]) -> Vec<&'a T> {
    let erased: Vec<&dyn Ordered> = members.iter().map(|m| m as &dyn Ordered).collect();
    let indices = match ordering.order(owner, &erased) {
        Some(indices) if is_permutation(&indices, members.len()) => indices,
        Some(_) => {
            tracing::warn!(
                owner,
                ?ordering,
                "member ordering returned an invalid permutation; using enumeration order"
            );
            (0..members.len()).collect()
        }
        None => {
            tracing::debug!(owner, ?ordering, "member order unresolved; using enumeration order");
            (0..members.len()).collect()
        }
    };
    indices.into_iter().map(|i| &members[i]).collect()
}

fn is_permutation(indices: &[usize], len: usize) -> bool {
    if indices.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    for &i in indices {
        match seen.get_mut(i) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}
