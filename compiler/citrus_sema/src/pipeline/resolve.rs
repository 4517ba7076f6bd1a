//! Per-kind resolution of declarations, statements and expressions.
//!
//! Children are resolved by the coordinator before these run, except where
//! a kind needs a different order (functions, calls, member access).

use citrus_ast::{BinaryOp, NodeId, NodeKind};
use citrus_diagnostic::SemaError;
use citrus_types::{Idx, Pool};

use crate::module::Resolve;
use crate::search::ShapeMatch;
use crate::{Module, Query};

/// Type both operands of an arithmetic or comparison operator convert to.
pub(crate) fn common_type(pool: &mut Pool, lhs: Idx, rhs: Idx) -> Option<Idx> {
    let (lhs, rhs) = (pool.strip_const(lhs), pool.strip_const(rhs));
    if lhs == rhs {
        return Some(lhs);
    }
    fn numeric(pool: &Pool, t: Idx) -> bool {
        pool.is_numeric_ty(t) || pool.is_bool_ty(t)
    }

    if !numeric(pool, lhs) || !numeric(pool, rhs) {
        return None;
    }
    if pool.is_floating_point_ty(lhs) || pool.is_floating_point_ty(rhs) {
        return Some(if pool.is_double_ty(lhs) || pool.is_double_ty(rhs) {
            Idx::DOUBLE
        } else if pool.is_floating_point_ty(lhs) {
            lhs
        } else {
            rhs
        });
    }
    if pool.is_bool_ty(lhs) {
        return Some(rhs);
    }
    if pool.is_bool_ty(rhs) {
        return Some(lhs);
    }
    let (lw, rw) = (pool.int_width(lhs)?, pool.int_width(rhs)?);
    let signed = match lw.cmp(&rw) {
        std::cmp::Ordering::Greater => pool.is_signed(lhs),
        std::cmp::Ordering::Less => pool.is_signed(rhs),
        std::cmp::Ordering::Equal => pool.is_signed(lhs) && pool.is_signed(rhs),
    };
    Some(pool.int(lw.max(rw), signed))
}

impl Module {
    pub(super) fn resolve_function(&mut self, id: NodeId) -> Resolve {
        self.signature(id)?;
        let Some(decl) = self.ast.kind(id).fn_decl() else {
            return Ok(());
        };
        let (params, body) = (decl.params.clone(), decl.body);
        for param in params {
            self.resolve_node(param)?;
        }
        match body {
            Some(body) => self.resolve_node(body),
            None => Ok(()),
        }
    }

    pub(super) fn resolve_ident(&mut self, id: NodeId, expected: Option<Idx>) -> Resolve {
        let NodeKind::Ident { name, .. } = self.ast.kind(id) else {
            return Ok(());
        };
        let name = name.clone();
        let query = Query::new(&name).before_use().expecting_opt(expected);
        let Some(target) = self.lookup(&query, Some(id))? else {
            return Err(self.undefined(&name, id).into());
        };
        if matches!(self.ast.kind(target), NodeKind::Class { .. }) {
            return Err(self
                .code_error(id, format!("class `{name}` can not be used as a value"))
                .into());
        }
        if self.is_template(target) {
            return Err(self
                .code_error(id, format!("can not infer generic arguments of `{name}`"))
                .into());
        }

        if let NodeKind::Ident { target: slot, .. } = self.ast.kind_mut(id) {
            *slot = Some(target);
        }
        self.ast.add_dependency(id, target)?;
        let ty = self.type_of(target)?;
        self.set_ty(id, ty);
        Ok(())
    }

    /// `object.name`: a field or a method of the object's class.
    pub(super) fn resolve_member(&mut self, id: NodeId, expected: Option<Idx>) -> Resolve {
        let NodeKind::Member { object, name, .. } = self.ast.kind(id) else {
            return Ok(());
        };
        let (object, name) = (*object, name.clone());
        let object_ty = self.type_of(object)?;
        let value_ty = match self.pool.base_ty(object_ty) {
            Some(inner) if self.pool.is_pointer_ty(object_ty) => inner,
            _ => object_ty,
        };
        let class_ty = self.pool.strip_const(value_ty);
        let Some(class) = self.pool.named_decl(class_ty).map(NodeId::from_raw) else {
            return Err(self
                .code_error(
                    id,
                    format!("{} has no members", self.pool.get_string(object_ty)),
                )
                .into());
        };

        let candidates: Vec<NodeId> = self
            .ast
            .children(class)
            .iter()
            .copied()
            .filter(|&m| {
                matches!(
                    self.ast.kind(m),
                    NodeKind::MemberVar { .. } | NodeKind::Method { .. }
                ) && self.ast.name(m) == Some(name.as_str())
                    && !self.is_instance(m)
            })
            .collect();

        // The call shape lacks the receiver; instance methods take `this` first.
        let with_this = expected.map(|expected| {
            let this = self.pool.pointer_to(class_ty);
            let mut params = vec![this];
            params.extend_from_slice(self.pool.fn_params(expected));
            self.pool.function(&params, Idx::INFER, false)
        });
        let chosen = match (expected, with_this) {
            (Some(expected), Some(with_this)) => {
                let shaped: Vec<(NodeId, Idx)> = candidates
                    .iter()
                    .map(|&m| {
                        let takes_this = matches!(
                            self.ast.kind(m),
                            NodeKind::Method {
                                is_static: false,
                                ..
                            }
                        );
                        (m, if takes_this { with_this } else { expected })
                    })
                    .collect();
                match self.best_overload(shaped.iter().copied())? {
                    // No overload fits: keep the first so the call reports why.
                    Some((_, ShapeMatch::Mismatch)) => shaped.first().copied(),
                    Some((found, _)) => shaped.iter().copied().find(|&(m, _)| m == found),
                    None => None,
                }
            }
            _ => candidates.first().map(|&m| (m, Idx::INFER)),
        };
        let Some((mut member, shape)) = chosen else {
            return Err(self.undefined(&name, id).into());
        };
        self.check_access(member, id)?;

        if self.is_template(member) {
            if expected.is_none() {
                return Err(self
                    .code_error(id, format!("can not infer generic arguments of `{name}`"))
                    .into());
            }
            member = self.instantiate_for(member, shape)?;
        }

        if let NodeKind::Member { target, .. } = self.ast.kind_mut(id) {
            *target = Some(member);
        }
        self.ast.add_dependency(id, member)?;
        let ty = self.type_of(member)?;
        self.set_ty(id, ty);
        Ok(())
    }

    pub(super) fn resolve_loop(&mut self, id: NodeId) -> Resolve {
        let NodeKind::Loop {
            condition: Some(condition),
            ..
        } = self.ast.kind(id)
        else {
            return Ok(());
        };
        let condition = *condition;
        let ty = self.type_of(condition)?;
        if !self.pool.is_bool_ty(ty) {
            return Err(self
                .code_error(
                    condition,
                    format!(
                        "condition of loop is {}, expected bool",
                        self.pool.get_string(ty)
                    ),
                )
                .into());
        }
        Ok(())
    }

    /// Kinds whose children are already resolved.
    pub(super) fn resolve_kind(&mut self, id: NodeId) -> Resolve {
        match self.ast.kind(id).clone() {
            NodeKind::IntLit { ty, .. } => {
                let ty = match ty {
                    Some(ty) => self.resolve_type(&ty, id)?,
                    None => self.pool.int(self.options.int_literal_width, true),
                };
                self.set_ty(id, ty);
            }
            NodeKind::FloatLit { ty, .. } => {
                let ty = match ty {
                    Some(ty) => self.resolve_type(&ty, id)?,
                    None if self.options.float_literal_double => Idx::DOUBLE,
                    None => Idx::FLOAT,
                };
                self.set_ty(id, ty);
            }
            NodeKind::BoolLit { .. } => self.set_ty(id, Idx::BOOL),
            NodeKind::Param { .. } | NodeKind::MemberVar { .. } => {
                self.signature(id)?;
            }
            NodeKind::Var { name, ty, init } => self.resolve_var(id, &name, ty, init)?,
            NodeKind::Binary { op, lhs, rhs } => self.resolve_binary(id, op, lhs, rhs)?,
            NodeKind::Deref { operand } => {
                let ty = self.type_of(operand)?;
                match self.pool.base_ty(ty) {
                    Some(inner) if self.pool.is_pointer_ty(ty) => self.set_ty(id, inner),
                    _ => {
                        return Err(self
                            .code_error(id, "can not dereference non-pointer type")
                            .into());
                    }
                }
            }
            NodeKind::AddressOf { operand } => {
                if !self.is_assignable(operand) {
                    return Err(self
                        .code_error(
                            id,
                            format!("can not take the address of {}", self.describe(operand)),
                        )
                        .into());
                }
                let ty = self.type_of(operand)?;
                let ptr = match self.pool.base_ty(ty) {
                    Some(elem) if self.pool.is_array_ty(ty) => self.pool.pointer_to(elem),
                    _ => self.pool.pointer_to(ty),
                };
                self.set_ty(id, ptr);
            }
            NodeKind::Return { value } => self.resolve_return(id, value)?,
            NodeKind::Break | NodeKind::Continue => {
                if self.enclosing_loop(id).is_none() {
                    return Err(self
                        .code_error(id, format!("{} outside of a loop", self.ast.kind(id).label()))
                        .into());
                }
            }
            // Storage is typed by the constructor call that owns it.
            _ => {}
        }
        Ok(())
    }

    fn resolve_var(
        &mut self,
        id: NodeId,
        name: &str,
        declared: Option<citrus_ast::TypeExpr>,
        init: Option<NodeId>,
    ) -> Resolve {
        let declared = match declared {
            Some(ty) => Some(self.resolve_type(&ty, id)?),
            None => None,
        };
        let init_ty = match init {
            Some(init) => Some(self.type_of(init)?),
            None => None,
        };
        let ty = match (declared, init_ty) {
            (Some(declared), Some(init_ty)) => {
                if !self.pool.is_castable(init_ty, declared) {
                    return Err(self
                        .code_error(
                            id,
                            format!(
                                "can not initialize `{name}` of type {} with {}",
                                self.pool.get_string(declared),
                                self.pool.get_string(init_ty)
                            ),
                        )
                        .into());
                }
                declared
            }
            (Some(declared), None) => declared,
            (None, Some(init_ty)) => init_ty,
            (None, None) => {
                return Err(self
                    .code_error(id, format!("can not infer the type of `{name}`"))
                    .into());
            }
        };
        if self.pool.is_void_ty(ty) {
            return Err(self
                .code_error(id, format!("variable `{name}` can not have type void"))
                .into());
        }
        self.set_ty(id, ty);
        Ok(())
    }

    fn resolve_binary(&mut self, id: NodeId, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> Resolve {
        let (lhs_ty, rhs_ty) = (self.type_of(lhs)?, self.type_of(rhs)?);
        if op == BinaryOp::Assign {
            if !self.is_assignable(lhs) {
                return Err(self
                    .code_error(lhs, format!("can not assign to {}", self.describe(lhs)))
                    .into());
            }
            if !self.pool.is_castable(rhs_ty, lhs_ty) {
                return Err(SemaError::code2(
                    lhs,
                    rhs,
                    self.loc(id),
                    format!(
                        "can not assign {} to {}",
                        self.pool.get_string(rhs_ty),
                        self.pool.get_string(lhs_ty)
                    ),
                )
                .into());
            }
            self.set_ty(id, lhs_ty);
            return Ok(());
        }

        let pointers = self.pool.is_pointer_ty(lhs_ty) && lhs_ty == rhs_ty;
        let operands = common_type(&mut self.pool, lhs_ty, rhs_ty);
        let ty = if op.is_comparison() {
            (operands.is_some() || pointers).then_some(Idx::BOOL)
        } else {
            operands.filter(|&ty| !self.pool.is_bool_ty(ty))
        };
        let Some(ty) = ty else {
            return Err(SemaError::code2(
                lhs,
                rhs,
                self.loc(id),
                format!(
                    "invalid operands to `{}`: {} and {}",
                    op.symbol(),
                    self.pool.get_string(lhs_ty),
                    self.pool.get_string(rhs_ty)
                ),
            )
            .into());
        };
        self.set_ty(id, ty);
        Ok(())
    }

    fn resolve_return(&mut self, id: NodeId, value: Option<NodeId>) -> Resolve {
        let Some(callable) = self.enclosing_callable(id) else {
            return Err(self.code_error(id, "return outside of a function").into());
        };
        let sig = self.signature(callable)?;
        let ret = self.pool.fn_ret(sig).unwrap_or(Idx::VOID);
        match value {
            Some(value) => {
                let ty = self.type_of(value)?;
                if self.pool.is_void_ty(ret) {
                    return Err(self
                        .code_error(id, "can not return a value from a function returning void")
                        .into());
                }
                if !self.pool.is_castable(ty, ret) {
                    return Err(self
                        .code_error(
                            id,
                            format!(
                                "can not return {} from a function returning {}",
                                self.pool.get_string(ty),
                                self.pool.get_string(ret)
                            ),
                        )
                        .into());
                }
            }
            None if !self.pool.is_void_ty(ret) => {
                return Err(self
                    .code_error(
                        id,
                        format!(
                            "missing return value in a function returning {}",
                            self.pool.get_string(ret)
                        ),
                    )
                    .into());
            }
            None => {}
        }
        Ok(())
    }

    /// Expression denotes storage that can be written or addressed.
    pub(crate) fn is_assignable(&self, id: NodeId) -> bool {
        match self.ast.kind(id) {
            NodeKind::Ident {
                target: Some(target),
                ..
            } => matches!(
                self.ast.kind(*target),
                NodeKind::Var { .. } | NodeKind::Param { .. }
            ),
            NodeKind::Member {
                target: Some(target),
                ..
            } => matches!(self.ast.kind(*target), NodeKind::MemberVar { .. }),
            NodeKind::Deref { .. } => true,
            _ => false,
        }
    }

    /// Loop that `break`/`continue` at `id` applies to. Stops at the
    /// enclosing callable.
    pub(crate) fn enclosing_loop(&mut self, id: NodeId) -> Option<NodeId> {
        let found = self.searcher.find_parent(&self.ast, id, |kind| {
            matches!(
                kind,
                NodeKind::Loop { .. }
                    | NodeKind::Function(_)
                    | NodeKind::Method { .. }
                    | NodeKind::Constructor { .. }
            )
        })?;
        matches!(self.ast.kind(found), NodeKind::Loop { .. }).then_some(found)
    }
}
