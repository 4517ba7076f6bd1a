//! Expressions, lvalues and implicit conversions.

use citrus_ast::{BinaryOp, NodeId, NodeKind};
use citrus_diagnostic::SemaError;
use citrus_ir::{BinOp, ValueId};
use citrus_types::{Cast, CastOp, Idx};

use super::Lowerer;
use crate::pipeline::common_type;

fn bin_op(op: BinaryOp) -> Option<BinOp> {
    Some(match op {
        BinaryOp::Add => BinOp::Add,
        BinaryOp::Sub => BinOp::Sub,
        BinaryOp::Mul => BinOp::Mul,
        BinaryOp::Div => BinOp::Div,
        BinaryOp::Lt => BinOp::Lt,
        BinaryOp::Le => BinOp::Le,
        BinaryOp::Gt => BinOp::Gt,
        BinaryOp::Ge => BinOp::Ge,
        BinaryOp::Eq => BinOp::Eq,
        BinaryOp::Ne => BinOp::Ne,
        BinaryOp::Assign => return None,
    })
}

impl Lowerer<'_> {
    /// Value of an expression. Recorded for later lookup by node.
    pub(super) fn lower_expr(&mut self, id: NodeId) -> Result<ValueId, SemaError> {
        let value = self.lower_expr_inner(id)?;
        self.module.lowered.insert(id, value);
        Ok(value)
    }

    fn lower_expr_inner(&mut self, id: NodeId) -> Result<ValueId, SemaError> {
        match self.module.ast.kind(id).clone() {
            NodeKind::IntLit { value, .. } => {
                let ty = self.node_ty(id)?;
                Ok(self.backend.const_int(ty, value))
            }
            NodeKind::FloatLit { value, .. } => {
                let ty = self.node_ty(id)?;
                Ok(self.backend.const_float(ty, value))
            }
            NodeKind::BoolLit { value } => Ok(self.backend.const_bool(value)),
            NodeKind::Ident { target, .. } => match target {
                Some(target) if self.ctx.slots.contains_key(&target) => {
                    let ty = self.node_ty(id)?;
                    let slot = self.slot(target)?;
                    Ok(self.backend.load(ty, slot))
                }
                Some(target) => self.function_ref(id, target),
                None => Err(self.unlowerable(id)),
            },
            NodeKind::Binary { op, lhs, rhs } => self.lower_binary(id, op, lhs, rhs),
            NodeKind::Deref { operand } => {
                let ptr = self.lower_expr(operand)?;
                let ty = self.node_ty(id)?;
                Ok(self.backend.load(ty, ptr))
            }
            NodeKind::AddressOf { operand } => {
                let addr = self.lower_address(operand)?;
                let operand_ty = self.node_ty(operand)?;
                if self.module.pool.is_array_ty(operand_ty) {
                    let ty = self.node_ty(id)?;
                    Ok(self.backend.cast(CastOp::BitCast, addr, ty))
                } else {
                    Ok(addr)
                }
            }
            NodeKind::Member { target, .. } => match target {
                Some(target) if matches!(self.module.ast.kind(target), NodeKind::MemberVar { .. }) => {
                    let addr = self.lower_address(id)?;
                    let ty = self.node_ty(id)?;
                    Ok(self.backend.load(ty, addr))
                }
                Some(target) => self.function_ref(id, target),
                None => Err(self.unlowerable(id)),
            },
            NodeKind::Call { .. } => self.lower_call(id),
            NodeKind::CtorCall { .. } => self.lower_ctor_call(id),
            NodeKind::Storage => self
                .module
                .lowered
                .get(&id)
                .copied()
                .ok_or_else(|| self.unlowerable(id)),
            _ => Err(self.unlowerable(id)),
        }
    }

    fn lower_binary(
        &mut self,
        id: NodeId,
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    ) -> Result<ValueId, SemaError> {
        let (lhs_ty, rhs_ty) = (self.node_ty(lhs)?, self.node_ty(rhs)?);
        let Some(ir_op) = bin_op(op) else {
            let value = self.lower_expr(rhs)?;
            let value = self.coerce(value, rhs_ty, lhs_ty)?;
            let addr = self.lower_address(lhs)?;
            self.backend.store(value, addr);
            return Ok(value);
        };

        let operand_ty = if op.is_comparison() {
            common_type(&mut self.module.pool, lhs_ty, rhs_ty).unwrap_or(lhs_ty)
        } else {
            self.node_ty(id)?
        };
        let l = self.lower_expr(lhs)?;
        let l = self.coerce(l, lhs_ty, operand_ty)?;
        let r = self.lower_expr(rhs)?;
        let r = self.coerce(r, rhs_ty, operand_ty)?;
        Ok(self.backend.binary(ir_op, operand_ty, l, r))
    }

    /// Address of an assignable expression.
    pub(super) fn lower_address(&mut self, id: NodeId) -> Result<ValueId, SemaError> {
        match self.module.ast.kind(id).clone() {
            NodeKind::Ident {
                target: Some(target),
                ..
            } => self.slot(target),
            NodeKind::Deref { operand } => self.lower_expr(operand),
            NodeKind::Member {
                object,
                target: Some(target),
                ..
            } => {
                let (base, class_ty) = self.object_address(object)?;
                let Some(field) = self.field_index(target) else {
                    return Err(self.unlowerable(id));
                };
                Ok(self.backend.field_address(base, class_ty, field))
            }
            _ => Err(self.unlowerable(id)),
        }
    }

    /// Address of a class object and its class type. The object may be the
    /// class value itself or a pointer to it.
    pub(super) fn object_address(&mut self, object: NodeId) -> Result<(ValueId, Idx), SemaError> {
        let ty = self.node_ty(object)?;
        match self.module.pool.base_ty(ty) {
            Some(class_ty) if self.module.pool.is_pointer_ty(ty) => {
                Ok((self.lower_expr(object)?, class_ty))
            }
            _ => Ok((self.lower_address(object)?, ty)),
        }
    }

    /// Position of a member variable among its class's fields.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "field counts never exceed u32"
    )]
    fn field_index(&self, member: NodeId) -> Option<u32> {
        let class = self.module.ast.parent(member)?;
        self.module
            .ast
            .children(class)
            .iter()
            .filter(|&&c| matches!(self.module.ast.kind(c), NodeKind::MemberVar { .. }))
            .position(|&c| c == member)
            .map(|i| i as u32)
    }

    fn function_ref(&mut self, id: NodeId, target: NodeId) -> Result<ValueId, SemaError> {
        match self.module.ast.kind(target) {
            NodeKind::Function(_) | NodeKind::Method { .. } => {
                let symbol = self.module.symbol(target);
                Ok(self.backend.function_ref(&symbol))
            }
            _ => Err(self.unlowerable(id)),
        }
    }

    pub(super) fn slot(&self, decl: NodeId) -> Result<ValueId, SemaError> {
        self.ctx.slots.get(&decl).copied().ok_or_else(|| {
            SemaError::fatal(format!(
                "{} has no stack slot",
                self.module.describe(decl)
            ))
        })
    }

    /// Convert `value` from `from` to `to` with the cast the type table
    /// names.
    pub(super) fn coerce(&mut self, value: ValueId, from: Idx, to: Idx) -> Result<ValueId, SemaError> {
        match self.module.pool.cast_between(from, to) {
            Some(Cast::Identity) => Ok(value),
            Some(Cast::Op(op)) => Ok(self.backend.cast(op, value, to)),
            None => Err(SemaError::fatal(format!(
                "no conversion from {} to {}",
                self.module.pool.get_string(from),
                self.module.pool.get_string(to)
            ))),
        }
    }

    fn unlowerable(&self, id: NodeId) -> SemaError {
        SemaError::fatal(format!(
            "can not lower {} ({id:?})",
            self.module.describe(id)
        ))
    }
}
