//! Cast definitions between built-in types.
//!
//! Every conversion the lowering layer can emit is named here. The table is
//! asymmetric: a cast from `from` to `to` is looked up on the source type,
//! exactly as a value would be converted in generated code.

use crate::{Idx, Pool, TypeData};

/// Primitive conversion instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CastOp {
    /// Integer to narrower integer.
    Trunc,
    /// Unsigned integer to wider integer.
    ZExt,
    /// Signed integer to wider integer.
    SExt,
    /// Floating point to unsigned integer.
    FpToUi,
    /// Floating point to signed integer.
    FpToSi,
    /// Unsigned integer to floating point.
    UiToFp,
    /// Signed integer to floating point.
    SiToFp,
    /// Floating point to narrower floating point.
    FpTrunc,
    /// Floating point to wider floating point.
    FpExt,
    /// Pointer to integer.
    PtrToInt,
    /// Integer to pointer.
    IntToPtr,
    /// Reinterpretation between pointer types.
    BitCast,
}

impl CastOp {
    /// Mnemonic used when printing IR.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            CastOp::Trunc => "trunc",
            CastOp::ZExt => "zext",
            CastOp::SExt => "sext",
            CastOp::FpToUi => "fptoui",
            CastOp::FpToSi => "fptosi",
            CastOp::UiToFp => "uitofp",
            CastOp::SiToFp => "sitofp",
            CastOp::FpTrunc => "fptrunc",
            CastOp::FpExt => "fpext",
            CastOp::PtrToInt => "ptrtoint",
            CastOp::IntToPtr => "inttoptr",
            CastOp::BitCast => "bitcast",
        }
    }
}

/// Result of looking up a conversion.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cast {
    /// Same underlying type; no instruction needed.
    Identity,
    /// Needs the given instruction.
    Op(CastOp),
}

impl Pool {
    /// Find the conversion from `from` to `to`, ignoring const qualification.
    ///
    /// Returns `None` when no cast is defined between the two types.
    pub fn cast_between(&self, from: Idx, to: Idx) -> Option<Cast> {
        let (src, dst) = (self.data(from), self.data(to));
        if src == dst {
            return Some(Cast::Identity);
        }
        let op = match (src, dst) {
            (
                TypeData::Int {
                    width: sw,
                    signed: ss,
                },
                TypeData::Int { width: dw, .. },
            ) => {
                if sw == dw {
                    return Some(Cast::Identity);
                } else if sw > dw {
                    CastOp::Trunc
                } else if *ss {
                    CastOp::SExt
                } else {
                    CastOp::ZExt
                }
            }
            (TypeData::Bool, TypeData::Int { .. }) => CastOp::ZExt,
            (TypeData::Int { .. }, TypeData::Bool) => CastOp::Trunc,
            (TypeData::Int { signed: true, .. }, TypeData::Float { .. }) => CastOp::SiToFp,
            (TypeData::Int { signed: false, .. }, TypeData::Float { .. }) => CastOp::UiToFp,
            (TypeData::Float { .. }, TypeData::Int { signed: true, .. }) => CastOp::FpToSi,
            (TypeData::Float { .. }, TypeData::Int { signed: false, .. }) => CastOp::FpToUi,
            (TypeData::Float { width: sw }, TypeData::Float { width: dw }) => {
                if sw > dw {
                    CastOp::FpTrunc
                } else {
                    CastOp::FpExt
                }
            }
            (TypeData::Pointer(_), TypeData::Int { .. }) => CastOp::PtrToInt,
            (TypeData::Int { .. }, TypeData::Pointer(_)) => CastOp::IntToPtr,
            (TypeData::Pointer(_) | TypeData::Array { .. }, TypeData::Pointer(_)) => {
                CastOp::BitCast
            }
            _ => return None,
        };
        Some(Cast::Op(op))
    }

    /// True if a value of `from` may be converted to `to`.
    pub fn is_castable(&self, from: Idx, to: Idx) -> bool {
        self.cast_between(from, to).is_some()
    }
}
