//! Cached per-type properties.
//!
//! Flags are computed once at interning time and propagate upward from
//! child types, so "does this signature still mention a placeholder" is a
//! single bit test.

use bitflags::bitflags;

bitflags! {
    /// Properties of an interned type.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u8 {
        /// One of the fixed primitive indices.
        const IS_PRIMITIVE = 1 << 0;
        /// Const-qualified.
        const IS_CONST = 1 << 1;
        /// Mentions a type variable somewhere inside.
        const HAS_VAR = 1 << 2;
        /// Mentions the `Infer` wildcard somewhere inside.
        const HAS_INFER = 1 << 3;
    }
}

impl TypeFlags {
    /// Flags that propagate from a child type to its parent.
    pub const PROPAGATE: Self = Self::HAS_VAR.union(Self::HAS_INFER);

    /// True if the type still contains a generic placeholder.
    #[inline]
    pub fn is_generic(self) -> bool {
        self.contains(Self::HAS_VAR)
    }
}
