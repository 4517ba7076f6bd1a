//! Unresolved type annotations.
//!
//! The parser attaches a `TypeExpr` wherever source text names a type. The
//! resolver turns it into an interned [`Idx`]; generic instantiation rewrites
//! the placeholders in place before the clone is resolved.

use citrus_types::Idx;
use rustc_hash::FxHashMap;

use crate::NodeId;

#[derive(Clone, Debug, PartialEq)]
pub enum TypeExpr {
    /// A type by name: a primitive (`int32`), a class, or a type parameter.
    Named(String),
    /// A generic class applied to arguments, e.g. `Box<int32>`.
    Applied(String, Vec<TypeExpr>),
    /// `T*`
    Pointer(Box<TypeExpr>),
    /// `T[n]`
    Array(Box<TypeExpr>, u64),
    /// The type declared by a node (a class); follows the node through copies.
    Decl(NodeId),
    /// An already-resolved type.
    Concrete(Idx),
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(name.into())
    }

    pub fn pointer(inner: TypeExpr) -> Self {
        TypeExpr::Pointer(Box::new(inner))
    }

    pub fn array(elem: TypeExpr, len: u64) -> Self {
        TypeExpr::Array(Box::new(elem), len)
    }

    /// Replace every occurrence of a bound type parameter by its concrete
    /// type. Returns `true` if anything changed.
    pub fn substitute(&mut self, bindings: &FxHashMap<String, Idx>) -> bool {
        match self {
            TypeExpr::Named(name) => match bindings.get(name.as_str()) {
                Some(&idx) => {
                    *self = TypeExpr::Concrete(idx);
                    true
                }
                None => false,
            },
            TypeExpr::Applied(_, args) => {
                let mut changed = false;
                for arg in args {
                    changed |= arg.substitute(bindings);
                }
                changed
            }
            TypeExpr::Pointer(inner) | TypeExpr::Array(inner, _) => inner.substitute(bindings),
            TypeExpr::Decl(_) | TypeExpr::Concrete(_) => false,
        }
    }

    /// Visit node ids embedded in the annotation.
    pub fn visit_ids_mut(&mut self, f: &mut impl FnMut(&mut NodeId)) {
        match self {
            TypeExpr::Decl(id) => f(id),
            TypeExpr::Applied(_, args) => {
                for arg in args {
                    arg.visit_ids_mut(f);
                }
            }
            TypeExpr::Pointer(inner) | TypeExpr::Array(inner, _) => inner.visit_ids_mut(f),
            TypeExpr::Named(_) | TypeExpr::Concrete(_) => {}
        }
    }
}
