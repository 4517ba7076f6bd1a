//! Structural payload of each type variant.

use smallvec::SmallVec;

use crate::Idx;

/// The structure of a type, excluding const qualification.
///
/// Constness is tracked by the pool entry, so `const int32` and `int32`
/// share the same `TypeData` but have different signatures and indices.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Void,
    Bool,
    /// Integer of `width` bits.
    Int { width: u8, signed: bool },
    /// Floating point of `width` bits (32 or 64).
    Float { width: u8 },
    /// Pointer to the inner type.
    Pointer(Idx),
    /// Fixed-size array `elem[len]`.
    Array { elem: Idx, len: u64 },
    /// Function `(params) -> ret`, optionally accepting trailing varargs.
    Function {
        params: SmallVec<[Idx; 4]>,
        ret: Idx,
        variadic: bool,
    },
    /// A class type. `decl` is the raw id of the declaring node, which keeps
    /// two classes with the same display name distinct.
    Named { name: String, decl: u32 },
    /// A type-variable placeholder declared by the generic entity `owner`.
    Var { name: String, owner: u32 },
    /// Wildcard matching any type; only appears in expected signatures.
    Infer,
}

impl TypeData {
    /// Direct child types, in signature order.
    pub fn children(&self) -> SmallVec<[Idx; 4]> {
        match self {
            TypeData::Pointer(inner) => smallvec::smallvec![*inner],
            TypeData::Array { elem, .. } => smallvec::smallvec![*elem],
            TypeData::Function { params, ret, .. } => {
                let mut out: SmallVec<[Idx; 4]> = params.clone();
                out.push(*ret);
                out
            }
            _ => SmallVec::new(),
        }
    }
}
