//! Downstream IR contract.
//!
//! The semantic layer lowers resolved trees through the [`IrBackend`] trait
//! and never learns how instructions are serialized. [`IrBuilder`] is the
//! in-tree implementation: it records functions as basic blocks in an
//! [`IrModule`] that tests inspect and tools dump as text.

mod backend;
mod builder;
mod ir;

pub use backend::{FunctionSig, IrBackend};
pub use builder::IrBuilder;
pub use ir::{
    BinOp, BlockId, Callee, Constant, FuncId, Instr, IrBlock, IrFunction, IrModule, Terminator,
    ValueId,
};
