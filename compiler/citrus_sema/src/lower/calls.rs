//! Calls and constructor calls.
//!
//! Fixed arguments are converted to their parameter types. Arguments in a
//! variadic tail get the default promotions instead: integers narrower than
//! 32 bits widen to 32, `float` widens to `double`. Arrays are passed as a
//! pointer to their first element.

use citrus_ast::{NodeId, NodeKind};
use citrus_diagnostic::SemaError;
use citrus_ir::{Callee, ValueId};
use citrus_types::{CastOp, Idx};

use super::Lowerer;
use crate::module::CallInfo;

impl Lowerer<'_> {
    pub(super) fn lower_call(&mut self, id: NodeId) -> Result<ValueId, SemaError> {
        let NodeKind::Call { callee, args } = self.module.ast.kind(id).clone() else {
            return Err(SemaError::fatal("expected a call"));
        };
        let info = self.call_info(id)?;
        if !self.module.pool.is_function_ty(info.fn_ty) {
            return Err(SemaError::fatal(format!(
                "can not call non-function type {}",
                self.module.pool.get_string(info.fn_ty)
            )));
        }

        let mut values = Vec::with_capacity(args.len() + 1);
        if let Some(receiver) = info.receiver {
            let (this, _) = self.object_address(receiver)?;
            values.push(this);
        }
        let params = self.module.pool.fn_params(info.fn_ty).to_vec();
        let fixed = params.get(values.len()..).unwrap_or_default().to_vec();
        self.lower_arguments(&args, &fixed, &mut values)?;

        let target = match info.target {
            Some(target) => Callee::Direct(self.module.symbol(target)),
            None => Callee::Indirect(self.lower_expr(callee)?),
        };
        let ret = self.module.pool.fn_ret(info.fn_ty).unwrap_or(Idx::VOID);
        Ok(self.backend.call(target, ret, values))
    }

    /// Allocate the object, pass its address as the hidden first argument,
    /// and yield the address.
    pub(super) fn lower_ctor_call(&mut self, id: NodeId) -> Result<ValueId, SemaError> {
        let NodeKind::CtorCall {
            args,
            storage: Some(storage),
            ..
        } = self.module.ast.kind(id).clone()
        else {
            return Err(SemaError::fatal("constructor call without storage"));
        };
        let info = self.call_info(id)?;
        let Some(ctor) = info.target else {
            return Err(SemaError::fatal("constructor call without a constructor"));
        };

        let this_ty = self.node_ty(id)?;
        let class_ty = self.module.pool.base_ty(this_ty).unwrap_or(this_ty);
        let slot = self.backend.alloca(class_ty);
        self.module.lowered.insert(storage, slot);

        let user_args: Vec<NodeId> = args.into_iter().filter(|&a| a != storage).collect();
        let params = self.module.pool.fn_params(info.fn_ty).to_vec();
        let fixed = params.get(1..).unwrap_or_default().to_vec();
        let mut values = vec![slot];
        self.lower_arguments(&user_args, &fixed, &mut values)?;

        let symbol = self.module.symbol(ctor);
        self.backend.call(Callee::Direct(symbol), this_ty, values);
        Ok(slot)
    }

    fn call_info(&self, id: NodeId) -> Result<CallInfo, SemaError> {
        self.module.calls.get(&id).copied().ok_or_else(|| {
            SemaError::fatal(format!(
                "{} was not resolved before build",
                self.module.describe(id)
            ))
        })
    }

    fn lower_arguments(
        &mut self,
        args: &[NodeId],
        fixed: &[Idx],
        out: &mut Vec<ValueId>,
    ) -> Result<(), SemaError> {
        for (i, &arg) in args.iter().enumerate() {
            let (value, ty) = self.lower_argument(arg)?;
            let value = match fixed.get(i) {
                Some(&param) => self.coerce(value, ty, param)?,
                None => self.promote(value, ty)?,
            };
            out.push(value);
        }
        Ok(())
    }

    /// Argument value and its type after array decay.
    fn lower_argument(&mut self, arg: NodeId) -> Result<(ValueId, Idx), SemaError> {
        let ty = self.node_ty(arg)?;
        match self.module.pool.base_ty(ty) {
            Some(elem) if self.module.pool.is_array_ty(ty) => {
                let addr = self.lower_address(arg)?;
                let ptr = self.module.pool.pointer_to(elem);
                Ok((self.backend.cast(CastOp::BitCast, addr, ptr), ptr))
            }
            _ => Ok((self.lower_expr(arg)?, ty)),
        }
    }

    /// Default argument promotion for the variadic tail.
    fn promote(&mut self, value: ValueId, ty: Idx) -> Result<ValueId, SemaError> {
        let pool = &self.module.pool;
        let to = if pool.is_bool_ty(ty) {
            Idx::INT32
        } else if pool.int_width(ty).is_some_and(|w| w < 32) {
            if pool.is_signed(ty) {
                Idx::INT32
            } else {
                Idx::UINT32
            }
        } else if pool.is_floating_point_ty(ty) {
            Idx::DOUBLE
        } else {
            return Ok(value);
        };
        self.coerce(value, ty, to)
    }
}
