//! Recording implementation of [`IrBackend`].
//!
//! Follows the "position at a block, emit instructions, terminate" pattern
//! of LLVM's `IRBuilder`. Blocks are created in id order but laid out in the
//! order requested through the `before` anchor, so a function can keep its
//! exit block last while loops insert their blocks ahead of it.

use citrus_types::{CastOp, Idx};

use crate::{
    BinOp, BlockId, Callee, FuncId, FunctionSig, Instr, IrBackend, IrBlock, IrFunction, IrModule,
    Terminator, ValueId,
};

/// In-progress basic block.
struct BlockBuilder {
    id: BlockId,
    name: String,
    body: Vec<Instr>,
    terminator: Option<Terminator>,
}

/// In-progress function.
struct FunctionBuilder {
    sig: FunctionSig,
    params: Vec<ValueId>,
    blocks: Vec<BlockBuilder>,
    layout: Vec<BlockId>,
    next_value: u32,
    defined: bool,
}

impl FunctionBuilder {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "parameter counts never exceed u32"
    )]
    fn new(sig: FunctionSig) -> Self {
        let params = (0..sig.params.len() as u32).map(ValueId::new).collect::<Vec<_>>();
        Self {
            next_value: params.len() as u32,
            params,
            sig,
            blocks: Vec::new(),
            layout: Vec::new(),
            defined: false,
        }
    }
}

/// Builder that records every function of a unit into an [`IrModule`].
#[derive(Default)]
pub struct IrBuilder {
    functions: Vec<FunctionBuilder>,
    current_fn: Option<FuncId>,
    current_block: BlockId,
}

impl IrBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn func(&self) -> &FunctionBuilder {
        debug_assert!(self.current_fn.is_some(), "no function is being built");
        let id = self.current_fn.unwrap_or(FuncId::new(0));
        &self.functions[id.index()]
    }

    fn func_mut(&mut self) -> &mut FunctionBuilder {
        debug_assert!(self.current_fn.is_some(), "no function is being built");
        let id = self.current_fn.unwrap_or(FuncId::new(0));
        &mut self.functions[id.index()]
    }

    fn fresh_value(&mut self) -> ValueId {
        let func = self.func_mut();
        let id = ValueId::new(func.next_value);
        func.next_value += 1;
        id
    }

    fn emit(&mut self, instr: Instr) {
        let block = self.current_block;
        let func = self.func_mut();
        let bb = &mut func.blocks[block.index()];
        debug_assert!(
            bb.terminator.is_none(),
            "emitting into terminated block {}",
            bb.name
        );
        bb.body.push(instr);
    }

    fn terminate(&mut self, terminator: Terminator) {
        let block = self.current_block;
        let bb = &mut self.func_mut().blocks[block.index()];
        debug_assert!(
            bb.terminator.is_none(),
            "block {} already terminated",
            bb.name
        );
        bb.terminator = Some(terminator);
    }

    /// Consume the builder and produce the finished module.
    ///
    /// Unterminated blocks get `Unreachable` as a fallback (with a tracing
    /// warning).
    pub fn finish(self) -> IrModule {
        let functions = self
            .functions
            .into_iter()
            .map(|mut func| {
                let mut blocks = Vec::with_capacity(func.layout.len());
                for id in &func.layout {
                    let bb = &mut func.blocks[id.index()];
                    let terminator = bb.terminator.take().unwrap_or_else(|| {
                        tracing::warn!(
                            function = %func.sig.symbol,
                            block = %bb.name,
                            "unterminated block, adding unreachable"
                        );
                        Terminator::Unreachable
                    });
                    blocks.push(IrBlock {
                        id: bb.id,
                        name: std::mem::take(&mut bb.name),
                        body: std::mem::take(&mut bb.body),
                        terminator,
                    });
                }
                IrFunction {
                    params: func.params.iter().copied().zip(func.sig.params.iter().copied()).collect(),
                    symbol: func.sig.symbol,
                    ret: func.sig.ret,
                    variadic: func.sig.variadic,
                    blocks,
                }
            })
            .collect();
        IrModule { functions }
    }
}

impl IrBackend for IrBuilder {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "function counts never exceed u32"
    )]
    fn declare_function(&mut self, sig: FunctionSig) -> FuncId {
        if let Some(pos) = self.functions.iter().position(|f| f.sig.symbol == sig.symbol) {
            return FuncId::new(pos as u32);
        }
        let id = FuncId::new(self.functions.len() as u32);
        self.functions.push(FunctionBuilder::new(sig));
        id
    }

    fn begin_function(&mut self, func: FuncId) {
        debug_assert!(
            !self.functions[func.index()].defined,
            "function {} defined twice",
            self.functions[func.index()].sig.symbol
        );
        self.functions[func.index()].defined = true;
        self.current_fn = Some(func);
    }

    fn end_function(&mut self) {
        self.current_fn = None;
        self.current_block = BlockId::new(0);
    }

    fn param(&self, index: usize) -> ValueId {
        self.func().params[index]
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "block indices never exceed u32"
    )]
    fn create_block(&mut self, name: &str, before: Option<BlockId>) -> BlockId {
        let func = self.func_mut();
        let id = BlockId::new(func.blocks.len() as u32);
        func.blocks.push(BlockBuilder {
            id,
            name: name.to_owned(),
            body: Vec::new(),
            terminator: None,
        });
        let at = before
            .and_then(|anchor| func.layout.iter().position(|&b| b == anchor))
            .unwrap_or(func.layout.len());
        func.layout.insert(at, id);
        id
    }

    fn position_at(&mut self, block: BlockId) {
        debug_assert!(
            block.index() < self.func().blocks.len(),
            "BlockId {} out of bounds (have {} blocks)",
            block.raw(),
            self.func().blocks.len(),
        );
        self.current_block = block;
    }

    #[inline]
    fn current_block(&self) -> BlockId {
        self.current_block
    }

    fn is_terminated(&self) -> bool {
        self.func().blocks[self.current_block.index()]
            .terminator
            .is_some()
    }

    fn br(&mut self, target: BlockId) {
        self.terminate(Terminator::Br { target });
    }

    fn cond_br(&mut self, cond: ValueId, then_block: BlockId, else_block: BlockId) {
        self.terminate(Terminator::CondBr {
            cond,
            then_block,
            else_block,
        });
    }

    fn ret(&mut self, value: Option<ValueId>) {
        self.terminate(Terminator::Ret { value });
    }

    fn alloca(&mut self, ty: Idx) -> ValueId {
        let dst = self.fresh_value();
        self.emit(Instr::Alloca { dst, ty });
        dst
    }

    fn load(&mut self, ty: Idx, ptr: ValueId) -> ValueId {
        let dst = self.fresh_value();
        self.emit(Instr::Load { dst, ty, ptr });
        dst
    }

    fn store(&mut self, value: ValueId, ptr: ValueId) {
        self.emit(Instr::Store { value, ptr });
    }

    fn cast(&mut self, op: CastOp, value: ValueId, to: Idx) -> ValueId {
        let dst = self.fresh_value();
        self.emit(Instr::Cast { dst, op, value, to });
        dst
    }

    fn call(&mut self, callee: Callee, ret: Idx, args: Vec<ValueId>) -> ValueId {
        let dst = self.fresh_value();
        self.emit(Instr::Call {
            dst,
            ret,
            callee,
            args,
        });
        dst
    }

    fn binary(&mut self, op: BinOp, ty: Idx, lhs: ValueId, rhs: ValueId) -> ValueId {
        let dst = self.fresh_value();
        self.emit(Instr::Binary {
            dst,
            op,
            ty,
            lhs,
            rhs,
        });
        dst
    }

    fn field_address(&mut self, base: ValueId, class: Idx, field: u32) -> ValueId {
        let dst = self.fresh_value();
        self.emit(Instr::FieldAddr {
            dst,
            base,
            class,
            field,
        });
        dst
    }

    fn const_int(&mut self, ty: Idx, value: i64) -> ValueId {
        let dst = self.fresh_value();
        self.emit(Instr::Const {
            dst,
            ty,
            value: crate::Constant::Int(value),
        });
        dst
    }

    fn const_float(&mut self, ty: Idx, value: f64) -> ValueId {
        let dst = self.fresh_value();
        self.emit(Instr::Const {
            dst,
            ty,
            value: crate::Constant::Float(value),
        });
        dst
    }

    fn const_bool(&mut self, value: bool) -> ValueId {
        let dst = self.fresh_value();
        self.emit(Instr::Const {
            dst,
            ty: Idx::BOOL,
            value: crate::Constant::Bool(value),
        });
        dst
    }

    fn function_ref(&mut self, symbol: &str) -> ValueId {
        let dst = self.fresh_value();
        self.emit(Instr::FuncRef {
            dst,
            symbol: symbol.to_owned(),
        });
        dst
    }
}

#[cfg(test)]
mod tests;
