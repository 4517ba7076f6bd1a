//! Knobs threaded through one compilation unit.

/// Options held by a [`Module`](crate::Module).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SemaOptions {
    /// Keep resolving independent nodes after an error and report them all.
    /// `false` stops at the first resolve error.
    pub batch_errors: bool,
    /// Bit width of integer literals without a type annotation.
    pub int_literal_width: u8,
    /// Unannotated float literals are `double` rather than `float`.
    pub float_literal_double: bool,
    /// Mangle methods, constructors and generic instances with their type
    /// signature. Free non-generic functions always keep their name.
    pub mangle_symbols: bool,
}

impl Default for SemaOptions {
    fn default() -> Self {
        Self {
            batch_errors: true,
            int_literal_width: 32,
            float_literal_double: true,
            mangle_symbols: true,
        }
    }
}
