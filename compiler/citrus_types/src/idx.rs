//! Type index handle.
//!
//! `Idx` is the only type representation handed around outside the pool.
//! Primitive types have fixed indices so they can be named without a pool.

use std::fmt;

/// A 32-bit index into the type [`Pool`](crate::Pool).
///
/// Types are compared by index equality, never structurally.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Idx(u32);

impl Idx {
    // === Primitive Types (indices 0-12) ===
    // Pre-interned at pool creation in exactly this order.

    /// The `void` type.
    pub const VOID: Self = Self(0);
    /// The `bool` type.
    pub const BOOL: Self = Self(1);
    /// Signed 8-bit integer.
    pub const INT8: Self = Self(2);
    /// Signed 16-bit integer.
    pub const INT16: Self = Self(3);
    /// Signed 32-bit integer.
    pub const INT32: Self = Self(4);
    /// Signed 64-bit integer.
    pub const INT64: Self = Self(5);
    /// Unsigned 8-bit integer.
    pub const UINT8: Self = Self(6);
    /// Unsigned 16-bit integer.
    pub const UINT16: Self = Self(7);
    /// Unsigned 32-bit integer.
    pub const UINT32: Self = Self(8);
    /// Unsigned 64-bit integer.
    pub const UINT64: Self = Self(9);
    /// 32-bit floating point (`float`).
    pub const FLOAT: Self = Self(10);
    /// 64-bit floating point (`double`), the widest floating type.
    pub const DOUBLE: Self = Self(11);
    /// Wildcard placeholder used for "any return type" in expected signatures.
    pub const INFER: Self = Self(12);

    /// Number of pre-interned primitive types.
    pub const PRIMITIVE_COUNT: u32 = 13;

    /// Sentinel value indicating no type.
    pub const NONE: Self = Self(u32::MAX);

    /// Create an index from a raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize`.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Check if this is a pre-interned primitive.
    #[inline]
    pub const fn is_primitive(self) -> bool {
        self.0 < Self::PRIMITIVE_COUNT
    }

    /// Check if this is the NONE sentinel.
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Human-readable name of a primitive, `None` for pool-allocated types.
    pub const fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("void"),
            1 => Some("bool"),
            2 => Some("int8"),
            3 => Some("int16"),
            4 => Some("int32"),
            5 => Some("int64"),
            6 => Some("uint8"),
            7 => Some("uint16"),
            8 => Some("uint32"),
            9 => Some("uint64"),
            10 => Some("float"),
            11 => Some("double"),
            12 => Some("var"),
            _ => None,
        }
    }
}

impl fmt::Debug for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "Idx::{}", name.to_uppercase()),
            None if self.is_none() => write!(f, "Idx::NONE"),
            None => write!(f, "Idx({})", self.0),
        }
    }
}

impl Default for Idx {
    fn default() -> Self {
        Self::NONE
    }
}
