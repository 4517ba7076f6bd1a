//! Lowering of resolved callables to basic blocks.
//!
//! Every function body gets an `entry` block holding the stack slots of its
//! parameters and locals, and an `exit` block that loads the return slot
//! and returns. `return` stores into the slot and branches to `exit`, so
//! blocks created while lowering the body can be laid out ahead of it.
//!
//! By build time the tree is known to be valid. Anything unexpected here is
//! a compiler bug and surfaces as a fatal error.

mod calls;
mod control_flow;
mod expr;

use citrus_ast::{NodeId, NodeKind};
use citrus_diagnostic::SemaError;
use citrus_ir::{BlockId, Callee, FunctionSig, IrBackend, ValueId};
use citrus_types::Idx;
use rustc_hash::FxHashMap;

use crate::Module;

/// Targets of `break` and `continue` inside one loop.
#[derive(Copy, Clone, Debug)]
pub(crate) struct LoopContext {
    /// Block after the loop. Absent when the loop never falls through.
    pub exit_block: Option<BlockId>,
    /// Block that starts the next iteration.
    pub continue_block: BlockId,
}

/// State of the function being lowered.
struct FunctionContext {
    ret: Idx,
    exit: BlockId,
    ret_slot: Option<ValueId>,
    /// Stack slot of each parameter and local variable.
    slots: FxHashMap<NodeId, ValueId>,
    loops: Vec<LoopContext>,
}

pub(crate) struct Lowerer<'a> {
    module: &'a mut Module,
    backend: &'a mut dyn IrBackend,
    ctx: FunctionContext,
}

/// Declare `id` and, when it has a body, emit it.
pub(crate) fn lower_callable(
    module: &mut Module,
    backend: &mut dyn IrBackend,
    id: NodeId,
) -> Result<(), SemaError> {
    let Some(fn_ty) = module.ty(id) else {
        return Err(SemaError::fatal(format!(
            "{} has no signature at build time",
            module.describe(id)
        )));
    };
    let ret = module.pool.fn_ret(fn_ty).unwrap_or(Idx::VOID);
    let sig = FunctionSig {
        symbol: module.symbol(id),
        params: module.pool.fn_params(fn_ty).to_vec(),
        ret,
        variadic: module.pool.fn_is_variadic(fn_ty),
    };
    tracing::debug!(symbol = %sig.symbol, "lowering callable");
    let param_count = sig.params.len();
    let func = backend.declare_function(sig);

    match module.ast.kind(id).clone() {
        NodeKind::Constructor { method, .. } => {
            backend.begin_function(func);
            let entry = backend.create_block("entry", None);
            backend.position_at(entry);
            if let Some(method) = method {
                let is_static = matches!(
                    module.ast.kind(method),
                    NodeKind::Method { is_static: true, .. }
                );
                let first = usize::from(is_static);
                let args: Vec<ValueId> = (first..param_count).map(|i| backend.param(i)).collect();
                let method_ret = module
                    .ty(method)
                    .and_then(|ty| module.pool.fn_ret(ty))
                    .unwrap_or(Idx::VOID);
                backend.call(Callee::Direct(module.symbol(method)), method_ret, args);
            }
            let this = backend.param(0);
            backend.ret(Some(this));
            backend.end_function();
            Ok(())
        }
        NodeKind::Function(decl) | NodeKind::Method { decl, .. } => {
            let Some(body) = decl.body else {
                return Ok(());
            };
            backend.begin_function(func);
            let entry = backend.create_block("entry", None);
            let exit = backend.create_block("exit", None);
            backend.position_at(entry);

            let mut lowerer = Lowerer {
                module,
                backend,
                ctx: FunctionContext {
                    ret,
                    exit,
                    ret_slot: None,
                    slots: FxHashMap::default(),
                    loops: Vec::new(),
                },
            };
            let result = lowerer.lower_function_body(&decl.params, body);
            lowerer.backend.end_function();
            result
        }
        _ => Err(SemaError::fatal(format!(
            "{} is not callable",
            module.describe(id)
        ))),
    }
}

impl Lowerer<'_> {
    fn lower_function_body(&mut self, params: &[NodeId], body: NodeId) -> Result<(), SemaError> {
        if !self.module.pool.is_void_ty(self.ctx.ret) {
            self.ctx.ret_slot = Some(self.backend.alloca(self.ctx.ret));
        }
        for (i, &param) in params.iter().enumerate() {
            let ty = self.node_ty(param)?;
            let slot = self.backend.alloca(ty);
            let value = self.backend.param(i);
            self.backend.store(value, slot);
            self.ctx.slots.insert(param, slot);
        }
        // Locals live for the whole call; allocate them up front.
        for id in self.module.ast.subtree(body) {
            if matches!(self.module.ast.kind(id), NodeKind::Var { .. }) {
                let ty = self.node_ty(id)?;
                let slot = self.backend.alloca(ty);
                self.ctx.slots.insert(id, slot);
            }
        }

        self.lower_stmt(body)?;
        if !self.backend.is_terminated() {
            self.backend.br(self.ctx.exit);
        }

        self.backend.position_at(self.ctx.exit);
        let value = match self.ctx.ret_slot {
            Some(slot) => Some(self.backend.load(self.ctx.ret, slot)),
            None => None,
        };
        self.backend.ret(value);
        Ok(())
    }

    /// Resolved type of `id`; missing types are a build-time bug.
    fn node_ty(&self, id: NodeId) -> Result<Idx, SemaError> {
        self.module.ty(id).ok_or_else(|| {
            SemaError::fatal(format!(
                "{} has no type at build time",
                self.module.describe(id)
            ))
        })
    }
}
