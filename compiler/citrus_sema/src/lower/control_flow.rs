//! Statements, blocks and loops.
//!
//! A loop owns up to four blocks:
//!
//! ```text
//! loop.cond:  br cond, loop.body, loop.end
//! loop.body:  ...statements...
//!             br loop.step | loop.cond | loop.body
//! loop.step:  ...afterthought...
//!             br loop.cond | loop.body
//! loop.end:   (code after the loop)
//! ```
//!
//! `loop.cond` exists only with a condition, `loop.step` only with an
//! afterthought, and `loop.end` only if the loop can fall through.

use citrus_ast::{NodeId, NodeKind};
use citrus_diagnostic::SemaError;

use super::{LoopContext, Lowerer};
use crate::Module;

impl Module {
    /// Statement is guaranteed to leave its enclosing block.
    ///
    /// A loop qualifies only when it has no condition, no `break` targets
    /// it, and its body reaches a `return` unconditionally.
    pub fn is_terminator(&self, id: NodeId) -> bool {
        match self.ast.kind(id) {
            NodeKind::Return { .. } | NodeKind::Break | NodeKind::Continue => true,
            NodeKind::Block => self.ast.children(id).iter().any(|&c| self.is_terminator(c)),
            NodeKind::Loop {
                condition: None,
                body,
                ..
            } => !self.has_break_for(id) && body.iter().any(|&s| self.returns(s)),
            _ => false,
        }
    }

    fn returns(&self, id: NodeId) -> bool {
        match self.ast.kind(id) {
            NodeKind::Return { .. } => true,
            NodeKind::Block => self.ast.children(id).iter().any(|&c| self.returns(c)),
            _ => false,
        }
    }

    fn has_break_for(&self, lp: NodeId) -> bool {
        self.ast
            .subtree(lp)
            .into_iter()
            .any(|id| {
                matches!(self.ast.kind(id), NodeKind::Break) && self.innermost_loop(id) == Some(lp)
            })
    }

    /// Loop a `break` or `continue` belongs to, without the parent cache.
    fn innermost_loop(&self, id: NodeId) -> Option<NodeId> {
        let mut cur = self.ast.parent(id);
        while let Some(node) = cur {
            match self.ast.kind(node) {
                NodeKind::Loop { .. } => return Some(node),
                NodeKind::Function(_) | NodeKind::Method { .. } | NodeKind::Constructor { .. } => {
                    return None;
                }
                _ => cur = self.ast.parent(node),
            }
        }
        None
    }
}

impl Lowerer<'_> {
    /// Lower statements in order, stopping after the first one that leaves
    /// the block.
    pub(super) fn lower_statements(&mut self, stmts: &[NodeId]) -> Result<(), SemaError> {
        for &stmt in stmts {
            if self.backend.is_terminated() {
                break;
            }
            self.lower_stmt(stmt)?;
            if self.module.is_terminator(stmt) {
                break;
            }
        }
        Ok(())
    }

    pub(super) fn lower_stmt(&mut self, id: NodeId) -> Result<(), SemaError> {
        match self.module.ast.kind(id).clone() {
            NodeKind::Block => {
                let children = self.module.ast.children(id).to_vec();
                self.lower_statements(&children)
            }
            NodeKind::Var { init, .. } => {
                if let Some(init) = init {
                    let value = self.lower_expr(init)?;
                    let (from, to) = (self.node_ty(init)?, self.node_ty(id)?);
                    let value = self.coerce(value, from, to)?;
                    let slot = self.slot(id)?;
                    self.backend.store(value, slot);
                }
                Ok(())
            }
            NodeKind::Return { value } => {
                if let (Some(value), Some(slot)) = (value, self.ctx.ret_slot) {
                    let result = self.lower_expr(value)?;
                    let from = self.node_ty(value)?;
                    let result = self.coerce(result, from, self.ctx.ret)?;
                    self.backend.store(result, slot);
                }
                self.backend.br(self.ctx.exit);
                Ok(())
            }
            NodeKind::Break => {
                match self.ctx.loops.last().and_then(|l| l.exit_block) {
                    Some(target) => self.backend.br(target),
                    None => tracing::warn!(?id, "break without a loop exit block"),
                }
                Ok(())
            }
            NodeKind::Continue => {
                match self.ctx.loops.last() {
                    Some(lp) => self.backend.br(lp.continue_block),
                    None => tracing::warn!(?id, "continue outside of a loop"),
                }
                Ok(())
            }
            NodeKind::Loop { .. } => self.lower_loop(id),
            _ => self.lower_expr(id).map(drop),
        }
    }

    fn lower_loop(&mut self, id: NodeId) -> Result<(), SemaError> {
        let NodeKind::Loop {
            initializers,
            condition,
            afterthought,
            body,
            post_check,
        } = self.module.ast.kind(id).clone()
        else {
            return Ok(());
        };

        self.lower_statements(&initializers)?;
        if self.backend.is_terminated() {
            return Ok(());
        }

        // Nested loops lay out their blocks ahead of the enclosing loop's exit.
        let anchor = self
            .ctx
            .loops
            .last()
            .and_then(|l| l.exit_block)
            .unwrap_or(self.ctx.exit);
        let cond_block = condition.map(|_| self.backend.create_block("loop.cond", Some(anchor)));
        let body_block = self.backend.create_block("loop.body", Some(anchor));
        let step_block = afterthought.map(|_| self.backend.create_block("loop.step", Some(anchor)));
        let exit_block = (!self.module.is_terminator(id))
            .then(|| self.backend.create_block("loop.end", Some(anchor)));

        let head = match cond_block {
            Some(cond) if !post_check => cond,
            _ => body_block,
        };
        self.backend.br(head);

        if let (Some(cond_block), Some(condition)) = (cond_block, condition) {
            self.backend.position_at(cond_block);
            let value = self.lower_expr(condition)?;
            let Some(end) = exit_block else {
                return Err(SemaError::fatal("conditional loop without an exit block"));
            };
            self.backend.cond_br(value, body_block, end);
        }

        let continue_block = step_block.or(cond_block).unwrap_or(body_block);
        self.backend.position_at(body_block);
        self.ctx.loops.push(LoopContext {
            exit_block,
            continue_block,
        });
        let lowered = self.lower_statements(&body);
        self.ctx.loops.pop();
        lowered?;
        if !self.backend.is_terminated() {
            self.backend.br(continue_block);
        }

        if let (Some(step_block), Some(afterthought)) = (step_block, afterthought) {
            self.backend.position_at(step_block);
            self.lower_expr(afterthought)?;
            self.backend.br(cond_block.unwrap_or(body_block));
        }

        if let Some(end) = exit_block {
            self.backend.position_at(end);
        }
        Ok(())
    }
}
