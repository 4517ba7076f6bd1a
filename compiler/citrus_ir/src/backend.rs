//! The instruction contract lowering issues against.

use citrus_types::{CastOp, Idx};

use crate::{BinOp, BlockId, Callee, FuncId, ValueId};

/// Signature of a function being declared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionSig {
    pub symbol: String,
    pub params: Vec<Idx>,
    pub ret: Idx,
    pub variadic: bool,
}

/// Capabilities the lowering needs from a code generator.
///
/// Block and instruction methods act on the function opened by
/// [`begin_function`](IrBackend::begin_function) and the block selected by
/// [`position_at`](IrBackend::position_at).
pub trait IrBackend {
    /// Declare a function; declaring the same symbol twice returns the
    /// existing id.
    fn declare_function(&mut self, sig: FunctionSig) -> FuncId;

    /// Start emitting the body of `func`.
    fn begin_function(&mut self, func: FuncId);

    /// Finish the current body.
    fn end_function(&mut self);

    /// Value bound to parameter `index` of the current function.
    fn param(&self, index: usize) -> ValueId;

    // Blocks

    /// Create a block, laid out before `before` if given, else at the end.
    fn create_block(&mut self, name: &str, before: Option<BlockId>) -> BlockId;
    fn position_at(&mut self, block: BlockId);
    fn current_block(&self) -> BlockId;
    /// Whether the current block already ends in a terminator.
    fn is_terminated(&self) -> bool;

    // Terminators

    fn br(&mut self, target: BlockId);
    fn cond_br(&mut self, cond: ValueId, then_block: BlockId, else_block: BlockId);
    fn ret(&mut self, value: Option<ValueId>);

    // Instructions

    fn alloca(&mut self, ty: Idx) -> ValueId;
    fn load(&mut self, ty: Idx, ptr: ValueId) -> ValueId;
    fn store(&mut self, value: ValueId, ptr: ValueId);
    fn cast(&mut self, op: CastOp, value: ValueId, to: Idx) -> ValueId;
    fn call(&mut self, callee: Callee, ret: Idx, args: Vec<ValueId>) -> ValueId;
    fn binary(&mut self, op: BinOp, ty: Idx, lhs: ValueId, rhs: ValueId) -> ValueId;
    fn field_address(&mut self, base: ValueId, class: Idx, field: u32) -> ValueId;
    fn const_int(&mut self, ty: Idx, value: i64) -> ValueId;
    fn const_float(&mut self, ty: Idx, value: f64) -> ValueId;
    fn const_bool(&mut self, value: bool) -> ValueId;
    fn function_ref(&mut self, symbol: &str) -> ValueId;
}
