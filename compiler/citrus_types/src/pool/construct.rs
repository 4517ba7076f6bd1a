//! Type construction helpers for the Pool.

use smallvec::SmallVec;

use crate::{Idx, Pool, TypeData};

impl Pool {
    /// Integer of the given width and signedness.
    ///
    /// Standard widths hit the pre-interned primitives.
    pub fn int(&mut self, width: u8, signed: bool) -> Idx {
        match (width, signed) {
            (8, true) => Idx::INT8,
            (16, true) => Idx::INT16,
            (32, true) => Idx::INT32,
            (64, true) => Idx::INT64,
            (8, false) => Idx::UINT8,
            (16, false) => Idx::UINT16,
            (32, false) => Idx::UINT32,
            (64, false) => Idx::UINT64,
            _ => self.intern(TypeData::Int { width, signed }),
        }
    }

    /// Floating point of the given precision.
    pub fn float(&mut self, width: u8) -> Idx {
        match width {
            32 => Idx::FLOAT,
            64 => Idx::DOUBLE,
            _ => self.intern(TypeData::Float { width }),
        }
    }

    /// Pointer to `inner`.
    pub fn pointer_to(&mut self, inner: Idx) -> Idx {
        self.intern(TypeData::Pointer(inner))
    }

    /// Fixed-size array `elem[len]`.
    pub fn array(&mut self, elem: Idx, len: u64) -> Idx {
        self.intern(TypeData::Array { elem, len })
    }

    /// Function type `(params...) -> ret`.
    pub fn function(&mut self, params: &[Idx], ret: Idx, variadic: bool) -> Idx {
        self.intern(TypeData::Function {
            params: params.iter().copied().collect::<SmallVec<[Idx; 4]>>(),
            ret,
            variadic,
        })
    }

    /// Class type declared by node `decl`.
    pub fn named(&mut self, name: impl Into<String>, decl: u32) -> Idx {
        self.intern(TypeData::Named {
            name: name.into(),
            decl,
        })
    }

    /// Type variable `name` declared by the generic entity `owner`.
    pub fn type_var(&mut self, name: impl Into<String>, owner: u32) -> Idx {
        self.intern(TypeData::Var {
            name: name.into(),
            owner,
        })
    }
}
