//! The type pool: one per compilation unit.
//!
//! Each entry stores its structural [`TypeData`], its const qualification,
//! its canonical signature, and its [`TypeFlags`]. The signature map is the
//! interning key, which makes `intern` idempotent: asking for a type whose
//! signature already exists returns the existing index.

mod construct;
mod format;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::{Idx, TypeData, TypeFlags};

/// One interned type.
#[derive(Clone, Debug)]
struct TypeEntry {
    data: TypeData,
    is_const: bool,
    signature: String,
    flags: TypeFlags,
}

/// Interned storage for every type of a compilation unit.
///
/// The pool is not shared across threads; the pipeline that owns it runs
/// single-threaded.
pub struct Pool {
    entries: Vec<TypeEntry>,
    by_signature: FxHashMap<String, Idx>,
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    /// Create a pool with the primitives at their fixed indices.
    pub fn new() -> Self {
        let mut pool = Self {
            entries: Vec::with_capacity(256),
            by_signature: FxHashMap::default(),
        };

        let primitives = [
            TypeData::Void,
            TypeData::Bool,
            TypeData::Int { width: 8, signed: true },
            TypeData::Int { width: 16, signed: true },
            TypeData::Int { width: 32, signed: true },
            TypeData::Int { width: 64, signed: true },
            TypeData::Int { width: 8, signed: false },
            TypeData::Int { width: 16, signed: false },
            TypeData::Int { width: 32, signed: false },
            TypeData::Int { width: 64, signed: false },
            TypeData::Float { width: 32 },
            TypeData::Float { width: 64 },
            TypeData::Infer,
        ];

        for data in primitives {
            let idx = pool.intern_with(data, false);
            debug_assert!(idx.is_primitive(), "primitive {idx:?} interned out of order");
        }

        pool
    }

    /// Number of interned types, including primitives and const variants.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// A pool always contains the primitives.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // === Interning ===

    /// Intern a non-const type.
    pub fn intern(&mut self, data: TypeData) -> Idx {
        self.intern_with(data, false)
    }

    /// Intern a type with an explicit const qualification.
    ///
    /// Calling this twice with equal arguments returns the same index.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "a compilation unit never holds u32::MAX types"
    )]
    pub fn intern_with(&mut self, data: TypeData, is_const: bool) -> Idx {
        let signature = self.encode_signature(&data, is_const);
        if let Some(&idx) = self.by_signature.get(&signature) {
            return idx;
        }

        let mut flags = TypeFlags::empty();
        for child in data.children() {
            flags |= self.flags(child) & TypeFlags::PROPAGATE;
        }
        match data {
            TypeData::Var { .. } => flags |= TypeFlags::HAS_VAR,
            TypeData::Infer => flags |= TypeFlags::HAS_INFER,
            _ => {}
        }
        if is_const {
            flags |= TypeFlags::IS_CONST;
        }

        let idx = Idx::from_raw(self.entries.len() as u32);
        if idx.is_primitive() {
            flags |= TypeFlags::IS_PRIMITIVE;
        }

        self.by_signature.insert(signature.clone(), idx);
        self.entries.push(TypeEntry {
            data,
            is_const,
            signature,
            flags,
        });
        idx
    }

    /// Look up a previously interned type by its canonical signature.
    pub fn get(&self, signature: &str) -> Option<Idx> {
        self.by_signature.get(signature).copied()
    }

    // === Accessors ===

    /// Structural payload of a type.
    pub fn data(&self, idx: Idx) -> &TypeData {
        &self.entries[idx.index()].data
    }

    /// Cached flags of a type.
    pub fn flags(&self, idx: Idx) -> TypeFlags {
        self.entries[idx.index()].flags
    }

    /// Canonical signature, used for interning and name mangling.
    pub fn signature(&self, idx: Idx) -> &str {
        &self.entries[idx.index()].signature
    }

    /// The const-qualified counterpart, itself interned.
    ///
    /// Applying this to a type that is already const returns it unchanged.
    pub fn get_const(&mut self, idx: Idx) -> Idx {
        let entry = &self.entries[idx.index()];
        if entry.is_const {
            return idx;
        }
        let data = entry.data.clone();
        self.intern_with(data, true)
    }

    /// The non-const counterpart of a type.
    pub fn strip_const(&mut self, idx: Idx) -> Idx {
        let entry = &self.entries[idx.index()];
        if !entry.is_const {
            return idx;
        }
        let data = entry.data.clone();
        self.intern_with(data, false)
    }

    // === Predicates ===

    pub fn is_const(&self, idx: Idx) -> bool {
        self.entries[idx.index()].is_const
    }

    pub fn is_void_ty(&self, idx: Idx) -> bool {
        matches!(self.data(idx), TypeData::Void)
    }

    pub fn is_bool_ty(&self, idx: Idx) -> bool {
        matches!(self.data(idx), TypeData::Bool)
    }

    pub fn is_int_ty(&self, idx: Idx) -> bool {
        matches!(self.data(idx), TypeData::Int { .. })
    }

    /// Signedness of an integer type; `false` for every other type.
    pub fn is_signed(&self, idx: Idx) -> bool {
        matches!(self.data(idx), TypeData::Int { signed: true, .. })
    }

    /// Bit width of an integer type.
    pub fn int_width(&self, idx: Idx) -> Option<u8> {
        match self.data(idx) {
            TypeData::Int { width, .. } => Some(*width),
            _ => None,
        }
    }

    pub fn is_floating_point_ty(&self, idx: Idx) -> bool {
        matches!(self.data(idx), TypeData::Float { .. })
    }

    /// 32-bit float specifically.
    pub fn is_float_ty(&self, idx: Idx) -> bool {
        matches!(self.data(idx), TypeData::Float { width: 32 })
    }

    pub fn is_double_ty(&self, idx: Idx) -> bool {
        matches!(self.data(idx), TypeData::Float { width: 64 })
    }

    pub fn is_numeric_ty(&self, idx: Idx) -> bool {
        self.is_int_ty(idx) || self.is_floating_point_ty(idx)
    }

    pub fn is_pointer_ty(&self, idx: Idx) -> bool {
        matches!(self.data(idx), TypeData::Pointer(_))
    }

    pub fn is_array_ty(&self, idx: Idx) -> bool {
        matches!(self.data(idx), TypeData::Array { .. })
    }

    pub fn is_function_ty(&self, idx: Idx) -> bool {
        matches!(self.data(idx), TypeData::Function { .. })
    }

    pub fn is_named_ty(&self, idx: Idx) -> bool {
        matches!(self.data(idx), TypeData::Named { .. })
    }

    pub fn is_var_ty(&self, idx: Idx) -> bool {
        matches!(self.data(idx), TypeData::Var { .. })
    }

    /// True if the type still mentions a generic placeholder.
    pub fn is_generic(&self, idx: Idx) -> bool {
        self.flags(idx).is_generic()
    }

    // === Component access ===

    /// Pointee of a pointer or element of an array.
    pub fn base_ty(&self, idx: Idx) -> Option<Idx> {
        match self.data(idx) {
            TypeData::Pointer(inner) => Some(*inner),
            TypeData::Array { elem, .. } => Some(*elem),
            _ => None,
        }
    }

    /// Parameter types of a function type.
    pub fn fn_params(&self, idx: Idx) -> &[Idx] {
        match self.data(idx) {
            TypeData::Function { params, .. } => params,
            _ => &[],
        }
    }

    /// Return type of a function type.
    pub fn fn_ret(&self, idx: Idx) -> Option<Idx> {
        match self.data(idx) {
            TypeData::Function { ret, .. } => Some(*ret),
            _ => None,
        }
    }

    /// Whether a function type accepts trailing variadic arguments.
    pub fn fn_is_variadic(&self, idx: Idx) -> bool {
        matches!(self.data(idx), TypeData::Function { variadic: true, .. })
    }

    /// Declaring node of a class type.
    pub fn named_decl(&self, idx: Idx) -> Option<u32> {
        match self.data(idx) {
            TypeData::Named { decl, .. } => Some(*decl),
            _ => None,
        }
    }

    /// Unwrap every level of pointer indirection.
    pub fn strip_pointers(&self, mut idx: Idx) -> Idx {
        while let TypeData::Pointer(inner) = self.data(idx) {
            idx = *inner;
        }
        idx
    }

    /// Replace type variables according to `lookup`, re-interning every
    /// type that changed. Types without variables come back unchanged.
    pub fn substitute(&mut self, idx: Idx, lookup: &dyn Fn(&TypeData) -> Option<Idx>) -> Idx {
        if !self.is_generic(idx) {
            return idx;
        }
        let is_const = self.is_const(idx);
        let data = self.data(idx).clone();
        if let TypeData::Var { .. } = data {
            return lookup(&data).unwrap_or(idx);
        }
        let new_data = match data {
            TypeData::Pointer(inner) => TypeData::Pointer(self.substitute(inner, lookup)),
            TypeData::Array { elem, len } => TypeData::Array {
                elem: self.substitute(elem, lookup),
                len,
            },
            TypeData::Function {
                params,
                ret,
                variadic,
            } => {
                let params: SmallVec<[Idx; 4]> =
                    params.iter().map(|&p| self.substitute(p, lookup)).collect();
                TypeData::Function {
                    params,
                    ret: self.substitute(ret, lookup),
                    variadic,
                }
            }
            other => other,
        };
        self.intern_with(new_data, is_const)
    }
}
