//! Type system for Citrus.
//!
//! Every type lives in a [`Pool`] and is referenced through a 32-bit
//! [`Idx`]. Types are interned by their canonical signature string, so two
//! types with the same signature are always the same `Idx` within one pool.
//! Equality checks throughout resolution are plain index comparisons.
//!
//! # Contents
//!
//! - [`Idx`] : the type handle, with fixed indices for the primitives
//! - [`TypeData`] : the structural payload of each type variant
//! - [`TypeFlags`] : cached per-type properties (contains a type variable, const, ...)
//! - [`Pool`] : interning, predicates, formatting and signature encoding
//! - [`CastOp`] : the cast table consulted by call and assignment lowering

mod cast;
mod data;
mod flags;
mod idx;
mod pool;

pub use cast::{Cast, CastOp};
pub use data::TypeData;
pub use flags::TypeFlags;
pub use idx::Idx;
pub use pool::Pool;
